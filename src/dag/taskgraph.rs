// src/dag/taskgraph.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dag::metadata::TaskMetadata;
use crate::dag::project::TaskGraphProject;
use crate::errors::{EntityKind, Result, TaskGraphError};
use crate::types::{new_id, ProjectId, ProjectStatus, TaskId, TaskStatus};

/// Name and derived status of one project, as listed in the project index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub status: ProjectStatus,
}

/// The set of projects managed by one engine.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    projects: BTreeMap<ProjectId, TaskGraphProject>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a project and return its fresh id.
    pub fn new_project(&mut self, name: impl Into<String>) -> ProjectId {
        let name = name.into();
        let id = new_id();
        info!(project = %id, name = %name, "created project");
        self.projects.insert(id.clone(), TaskGraphProject::new(name));
        id
    }

    /// Insert an already built project under `id`, replacing any previous one.
    pub fn insert_project(&mut self, id: impl Into<ProjectId>, project: TaskGraphProject) {
        self.projects.insert(id.into(), project);
    }

    /// Remove a project from memory. Its persisted file is left alone; see
    /// `DatabaseManager::delete_project` for that.
    pub fn remove_project(&mut self, id: &str) -> Result<TaskGraphProject> {
        let project = self
            .projects
            .remove(id)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Project, id))?;
        info!(project = %id, "removed project");
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> Result<&TaskGraphProject> {
        self.projects
            .get(id)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Project, id))
    }

    pub fn get_project_mut(&mut self, id: &str) -> Result<&mut TaskGraphProject> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Project, id))
    }

    pub fn contains_project(&self, id: &str) -> bool {
        self.projects.contains_key(id)
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &ProjectId> {
        self.projects.keys()
    }

    pub fn projects(&self) -> impl Iterator<Item = (&ProjectId, &TaskGraphProject)> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Tasks in `status`, grouped by project. Projects without a match are
    /// left out.
    pub fn get_tasks_by_status(
        &self,
        status: TaskStatus,
    ) -> BTreeMap<ProjectId, BTreeMap<TaskId, TaskMetadata>> {
        self.projects
            .iter()
            .map(|(id, project)| (id.clone(), project.tasks_with_status(status)))
            .filter(|(_, tasks)| !tasks.is_empty())
            .collect()
    }

    /// Name and status of every project. Statistics are refreshed first.
    pub fn get_data(&mut self) -> BTreeMap<ProjectId, ProjectSummary> {
        self.projects
            .iter_mut()
            .map(|(id, project)| {
                let status = project.update_statistics().project_status();
                let summary = ProjectSummary {
                    name: project.name().to_string(),
                    status,
                };
                (id.clone(), summary)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_remove_projects() {
        let mut graph = TaskGraph::new();
        let a = graph.new_project("alpha");
        let b = graph.new_project("beta");
        assert_ne!(a, b);
        assert_eq!(graph.len(), 2);

        graph.remove_project(&a).unwrap();
        assert!(!graph.contains_project(&a));
        assert!(graph.remove_project(&a).unwrap_err().is_not_found());
        assert!(graph.get_project("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn tasks_by_status_groups_per_project() {
        let mut graph = TaskGraph::new();
        let a = graph.new_project("alpha");
        let b = graph.new_project("beta");

        let project = graph.get_project_mut(&a).unwrap();
        let root = project.root_task().unwrap().to_string();
        let sub = project.add_sub_task(&root, None).unwrap();

        let active = graph.get_tasks_by_status(TaskStatus::Active);
        assert_eq!(active.len(), 2);
        assert!(active[&a].contains_key(&sub));
        assert_eq!(active[&b].len(), 1);

        let pending = graph.get_tasks_by_status(TaskStatus::Pending);
        assert_eq!(pending.keys().collect::<Vec<_>>(), vec![&a]);
        assert!(pending[&a].contains_key(&root));
        assert!(graph.get_tasks_by_status(TaskStatus::Done).is_empty());
    }

    #[test]
    fn get_data_reports_fresh_status() {
        let mut graph = TaskGraph::new();
        let id = graph.new_project("alpha");
        let project = graph.get_project_mut(&id).unwrap();
        let root = project.root_task().unwrap().to_string();
        project.task_done(&root).unwrap();

        let data = graph.get_data();
        assert_eq!(
            data[&id],
            ProjectSummary {
                name: "alpha".into(),
                status: ProjectStatus::Done
            }
        );
    }
}
