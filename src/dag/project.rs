// src/dag/project.rs

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dag::graph::{DagGraph, NodeLinkData};
use crate::dag::metadata::{Issue, IssuePatch, TaskMetadata, TaskPatch};
use crate::dag::resolver::{resolve_status, Resolution};
use crate::errors::{EntityKind, Result, TaskGraphError};
use crate::store::hash::compute_data_hash;
use crate::types::{new_id, EdgeId, IssueId, IssueStatus, ProjectStatus, TaskId, TaskStatus, Timestamp};

/// Name of the synthetic sink task created with every project.
pub const ROOT_TASK_NAME: &str = "Finish";

/// Key of the root task id in the node-link `graph` attributes.
const ROOT_GRAPH_KEY: &str = "root";

/// Per-status task counts, recomputed by [`TaskGraphProject::update_statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatistics {
    pub done: usize,
    pub active: usize,
    pub pending: usize,
    pub snoozed: usize,
}

impl ProjectStatistics {
    pub fn count(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Done => self.done,
            TaskStatus::Active => self.active,
            TaskStatus::Pending => self.pending,
            TaskStatus::Snoozed => self.snoozed,
        }
    }

    pub fn total(&self) -> usize {
        self.done + self.active + self.pending + self.snoozed
    }

    /// Active if any task is active, else snoozed if any task is snoozed,
    /// else done.
    pub fn project_status(&self) -> ProjectStatus {
        if self.active > 0 {
            ProjectStatus::Active
        } else if self.snoozed > 0 {
            ProjectStatus::Snoozed
        } else {
            ProjectStatus::Done
        }
    }
}

/// On-disk shape of one project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "DAG")]
    pub dag: NodeLinkData,
    #[serde(default)]
    pub metadata: BTreeMap<TaskId, TaskMetadata>,
}

/// One independent DAG of tasks plus their metadata.
///
/// Edges point from prerequisite to dependent: for `a -> b`, `b` cannot
/// become active before `a` is done. Every structural or temporal change
/// re-resolves the tasks it can affect.
#[derive(Debug, Clone)]
pub struct TaskGraphProject {
    name: String,
    dag: DagGraph,
    metadata: BTreeMap<TaskId, TaskMetadata>,
    statistics: ProjectStatistics,
    root: Option<TaskId>,
}

impl TaskGraphProject {
    /// Create a project holding only the synthetic "Finish" task.
    pub fn new(name: impl Into<String>) -> Self {
        let mut project = Self {
            name: name.into(),
            dag: DagGraph::new(),
            metadata: BTreeMap::new(),
            statistics: ProjectStatistics::default(),
            root: None,
        };

        let root = new_id();
        let mut meta = TaskMetadata::named(ROOT_TASK_NAME);
        meta.status = TaskStatus::Active;
        meta.last_modify = Some(Utc::now());
        project.insert_task(&root, meta);
        project.root = Some(root);
        project.update_statistics();
        project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the synthetic "Finish" task, if it still exists.
    pub fn root_task(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn dag(&self) -> &DagGraph {
        &self.dag
    }

    pub fn task(&self, task: &str) -> Option<&TaskMetadata> {
        self.metadata.get(task)
    }

    pub fn contains_task(&self, task: &str) -> bool {
        self.dag.contains_node(task)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&TaskId, &TaskMetadata)> {
        self.metadata.iter()
    }

    pub fn task_count(&self) -> usize {
        self.dag.node_count()
    }

    /// Last snapshot computed by [`update_statistics`](Self::update_statistics).
    pub fn statistics(&self) -> &ProjectStatistics {
        &self.statistics
    }

    /// Project status derived from the current statistics snapshot.
    pub fn status(&self) -> ProjectStatus {
        self.statistics.project_status()
    }

    /// Tasks currently in `status`, keyed by id.
    pub fn tasks_with_status(&self, status: TaskStatus) -> BTreeMap<TaskId, TaskMetadata> {
        self.metadata
            .iter()
            .filter(|(id, meta)| meta.status == status && self.dag.contains_node(id))
            .map(|(id, meta)| (id.clone(), meta.clone()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Tasks and dependencies
    // ------------------------------------------------------------------

    /// Create a task that `parent` depends on. The new task starts active;
    /// the parent is forced to pending through the dependency-add path.
    pub fn add_sub_task(&mut self, parent: &str, meta: Option<TaskMetadata>) -> Result<TaskId> {
        self.ensure_task(parent)?;

        let id = new_id();
        let mut meta = meta.unwrap_or_default();
        meta.status = TaskStatus::Active;
        meta.clear_snooze();
        meta.last_modify = Some(Utc::now());
        self.insert_task(&id, meta);
        self.add_dependency(parent, &id)?;

        debug!(task = %id, parent = %parent, "added sub-task");
        Ok(id)
    }

    /// Create a task that depends on `child`. The new task starts pending.
    pub fn add_super_task(&mut self, child: &str, meta: Option<TaskMetadata>) -> Result<TaskId> {
        self.ensure_task(child)?;

        let id = new_id();
        let mut meta = meta.unwrap_or_default();
        meta.status = TaskStatus::Pending;
        meta.clear_snooze();
        meta.last_modify = Some(Utc::now());
        self.insert_task(&id, meta);
        self.add_dependency(&id, child)?;

        debug!(task = %id, child = %child, "added super-task");
        Ok(id)
    }

    /// Make `task` depend on `dep`.
    ///
    /// `task` is forced to pending whatever the status of `dep`; the real
    /// status is derived on the next resolution of `task`.
    pub fn add_dependency(&mut self, task: &str, dep: &str) -> Result<EdgeId> {
        self.ensure_task(task)?;
        self.ensure_task(dep)?;

        let edge = self.dag.add_edge(dep, task)?;
        let meta = self.task_mut(task)?;
        meta.status = TaskStatus::Pending;
        meta.clear_snooze();
        meta.time_done = None;
        meta.last_modify = Some(Utc::now());

        debug!(task = %task, dep = %dep, edge = %edge, "added dependency");
        Ok(edge)
    }

    /// Remove the edge through which `task` depends on `dep`, then resolve
    /// `task`.
    pub fn remove_dependency(&mut self, task: &str, dep: &str) -> Result<()> {
        let edge = self
            .dag
            .find_edge(dep, task)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Dependency, format!("{dep} -> {task}")))?;
        self.remove_dependency_edge(&edge)
    }

    /// Remove a dependency edge by id, then resolve its dependent task.
    pub fn remove_dependency_edge(&mut self, edge_id: &str) -> Result<()> {
        let edge = self.dag.remove_edge(edge_id)?;
        debug!(task = %edge.target, dep = %edge.source, edge = %edge_id, "removed dependency");
        self.resolve_dependency(&edge.target)
    }

    /// Remove a task and its metadata, then resolve every former successor.
    pub fn remove_task(&mut self, task: &str) -> Result<()> {
        self.ensure_task(task)?;

        let successors: Vec<TaskId> = self
            .dag
            .successors(task)
            .into_iter()
            .map(str::to_string)
            .collect();

        self.dag.remove_node(task);
        self.metadata.remove(task);
        if self.root.as_deref() == Some(task) {
            warn!(task = %task, "removed the project's root task");
            self.root = None;
        }
        info!(task = %task, successors = successors.len(), "removed task");

        self.resolve_each(&successors, Utc::now())
    }

    /// Mark a task done and resolve its direct successors.
    pub fn task_done(&mut self, task: &str) -> Result<()> {
        let now = Utc::now();
        let meta = self.task_mut(task)?;
        meta.status = TaskStatus::Done;
        meta.clear_snooze();
        meta.time_done = Some(now);
        meta.last_modify = Some(now);
        info!(task = %task, "task done");

        let successors: Vec<TaskId> = self
            .dag
            .successors(task)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.resolve_each(&successors, now)
    }

    /// Snooze a task until `until`.
    ///
    /// The project does not schedule its own wake-up; callers pair this with
    /// a wake-up event on the scheduler.
    pub fn task_snooze(&mut self, task: &str, until: Timestamp, reason: Option<String>) -> Result<()> {
        let meta = self.task_mut(task)?;
        meta.status = TaskStatus::Snoozed;
        meta.wake_after = Some(until);
        meta.snooze_reason = reason;
        meta.last_modify = Some(Utc::now());
        info!(task = %task, %until, "task snoozed");
        Ok(())
    }

    /// Update the descriptive fields of a task.
    pub fn modify_task(&mut self, task: &str, patch: TaskPatch) -> Result<()> {
        let meta = self.task_mut(task)?;
        if let Some(name) = patch.name {
            meta.name = Some(name);
        }
        if let Some(detail) = patch.detail {
            meta.detail = Some(detail);
        }
        if let Some(remind_after) = patch.remind_after {
            meta.remind_after = Some(remind_after);
        }
        meta.last_modify = Some(Utc::now());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Re-derive the status of `task` from its predecessors and timing.
    pub fn resolve_dependency(&mut self, task: &str) -> Result<()> {
        self.resolve_dependency_at(task, Utc::now())
    }

    /// [`resolve_dependency`](Self::resolve_dependency) against an explicit clock.
    ///
    /// A task that no longer exists is skipped with a warning: a wake-up may
    /// fire after its task was removed.
    pub fn resolve_dependency_at(&mut self, task: &str, now: Timestamp) -> Result<()> {
        let Some(meta) = self.metadata.get(task).filter(|_| self.dag.contains_node(task)) else {
            warn!(task = %task, "resolution requested for a task that no longer exists");
            return Ok(());
        };

        let predecessors = self
            .dag
            .predecessors(task)
            .into_iter()
            .map(|p| self.metadata.get(p).map(|m| m.status));
        let resolution = resolve_status(meta, predecessors, now)?;

        let Resolution::Set(status) = resolution else {
            return Ok(());
        };
        if let Some(meta) = self.metadata.get_mut(task) {
            if meta.status == TaskStatus::Snoozed {
                meta.clear_snooze();
            }
            if meta.status != status {
                debug!(task = %task, from = ?meta.status, to = ?status, "status resolved");
                meta.status = status;
            }
        }
        Ok(())
    }

    /// Resolve each of `tasks` even if an earlier one fails; the first error
    /// is returned once all have been visited.
    fn resolve_each(&mut self, tasks: &[TaskId], now: Timestamp) -> Result<()> {
        let mut first_err = None;
        for task in tasks {
            if let Err(e) = self.resolve_dependency_at(task, now) {
                warn!(task = %task, error = %e, "failed to resolve task");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Resolve every task once, prerequisites before dependents.
    pub fn resolve_all(&mut self) -> Result<()> {
        let order = self.topological_order();
        self.resolve_each(&order, Utc::now())
    }

    /// Kahn ordering of the DAG. Nodes caught in a cycle are appended last.
    fn topological_order(&self) -> Vec<TaskId> {
        let mut in_degree: HashMap<&str, usize> = self
            .dag
            .nodes()
            .map(|n| (n, self.dag.predecessors(n).len()))
            .collect();

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        ready.sort_unstable();
        let mut queue: VecDeque<&str> = ready.into();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());
            for succ in self.dag.successors(node) {
                if let Some(d) = in_degree.get_mut(succ) {
                    *d = d.saturating_sub(1);
                    if *d == 0 {
                        queue.push_back(succ);
                    }
                }
            }
        }

        if order.len() < in_degree.len() {
            warn!(
                ordered = order.len(),
                total = in_degree.len(),
                "dependency cycle detected; resolving remaining tasks unordered"
            );
            let mut rest: Vec<TaskId> = in_degree
                .into_iter()
                .filter(|(_, d)| *d > 0)
                .map(|(n, _)| n.to_string())
                .collect();
            rest.sort();
            order.extend(rest);
        }
        order
    }

    // ------------------------------------------------------------------
    // Issues
    // ------------------------------------------------------------------

    pub fn task_open_issue(
        &mut self,
        task: &str,
        title: impl Into<String>,
        description: Option<String>,
        labels: Option<Vec<String>>,
    ) -> Result<IssueId> {
        let now = Utc::now();
        let meta = self.task_mut(task)?;

        let id = new_id();
        let mut issue = Issue::open(title);
        issue.description = description;
        issue.labels = labels;
        issue.time_modify = Some(now);
        meta.issues.insert(id.clone(), issue);
        meta.last_modify = Some(now);

        debug!(task = %task, issue = %id, "opened issue");
        Ok(id)
    }

    pub fn task_close_issue(&mut self, task: &str, issue: &str, reason: Option<String>) -> Result<()> {
        let now = Utc::now();
        let meta = self.task_mut(task)?;
        let entry = issue_mut(meta, issue)?;
        entry.status = IssueStatus::Closed;
        entry.close_reason = reason;
        entry.time_close = Some(now);
        entry.time_modify = Some(now);
        meta.last_modify = Some(now);

        debug!(task = %task, issue = %issue, "closed issue");
        Ok(())
    }

    pub fn task_modify_issue(&mut self, task: &str, issue: &str, patch: IssuePatch) -> Result<()> {
        let now = Utc::now();
        let meta = self.task_mut(task)?;
        let entry = issue_mut(meta, issue)?;
        if let Some(title) = patch.title {
            entry.title = title;
        }
        if let Some(description) = patch.description {
            entry.description = Some(description);
        }
        if let Some(labels) = patch.labels {
            entry.labels = Some(labels);
        }
        entry.time_modify = Some(now);
        meta.last_modify = Some(now);
        Ok(())
    }

    pub fn task_reopen_issue(&mut self, task: &str, issue: &str) -> Result<()> {
        let now = Utc::now();
        let meta = self.task_mut(task)?;
        let entry = issue_mut(meta, issue)?;
        entry.status = IssueStatus::Open;
        entry.close_reason = None;
        entry.time_close = None;
        entry.time_modify = Some(now);
        meta.last_modify = Some(now);

        debug!(task = %task, issue = %issue, "reopened issue");
        Ok(())
    }

    pub fn task_delete_issue(&mut self, task: &str, issue: &str) -> Result<Issue> {
        let meta = self.task_mut(task)?;
        let removed = meta
            .issues
            .remove(issue)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Issue, issue))?;
        meta.last_modify = Some(Utc::now());

        debug!(task = %task, issue = %issue, "deleted issue");
        Ok(removed)
    }

    /// Promote an issue to a sub-task of its task. The title becomes the
    /// task name, the description its detail; the issue is deleted.
    pub fn task_raise_issue(&mut self, task: &str, issue: &str) -> Result<TaskId> {
        let source = self
            .task(task)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Task, task))?
            .issues
            .get(issue)
            .cloned()
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Issue, issue))?;

        let meta = TaskMetadata {
            name: Some(source.title),
            detail: source.description,
            ..TaskMetadata::default()
        };
        let new_task = self.add_sub_task(task, Some(meta))?;
        self.task_delete_issue(task, issue)?;

        info!(task = %task, issue = %issue, new_task = %new_task, "raised issue to sub-task");
        Ok(new_task)
    }

    // ------------------------------------------------------------------
    // Statistics, hashing, serialization
    // ------------------------------------------------------------------

    /// Recompute the per-status counts with one full scan.
    pub fn update_statistics(&mut self) -> &ProjectStatistics {
        let mut stats = ProjectStatistics::default();
        for (id, meta) in &self.metadata {
            if !self.dag.contains_node(id) {
                continue;
            }
            match meta.status {
                TaskStatus::Done => stats.done += 1,
                TaskStatus::Active => stats.active += 1,
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Snoozed => stats.snoozed += 1,
            }
        }
        self.statistics = stats;
        &self.statistics
    }

    /// Drop metadata whose task is no longer a DAG node. Returns how many
    /// entries were removed.
    pub fn purge_metadata(&mut self) -> usize {
        let before = self.metadata.len();
        let dag = &self.dag;
        self.metadata.retain(|id, _| dag.contains_node(id));
        let removed = before - self.metadata.len();
        if removed > 0 {
            info!(removed, "purged orphaned task metadata");
        }
        removed
    }

    /// Snapshot in the persisted document shape.
    pub fn to_data(&self) -> ProjectData {
        let mut dag = self.dag.to_node_link();
        if let Some(root) = &self.root {
            dag.graph
                .insert(ROOT_GRAPH_KEY.to_string(), serde_json::Value::String(root.clone()));
        }
        ProjectData {
            name: self.name.clone(),
            dag,
            metadata: self.metadata.clone(),
        }
    }

    /// Canonical JSON form; identical content yields identical bytes.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_data())?)
    }

    /// Content hash of the canonical serialization, used as a change detector.
    pub fn get_data_hash(&self) -> Result<String> {
        Ok(compute_data_hash(self.serialize()?.as_bytes()))
    }

    /// Rebuild a project from its persisted shape.
    ///
    /// Nodes without metadata get a default entry; metadata without a node is
    /// kept until the next purge. The root is read from the `graph` attributes
    /// when present.
    pub fn from_data(data: ProjectData) -> Result<Self> {
        let dag = DagGraph::from_node_link(&data.dag)?;
        let mut metadata = data.metadata;

        for node in dag.nodes() {
            if !metadata.contains_key(node) {
                warn!(task = %node, "task has no metadata; using defaults");
                metadata.insert(node.to_string(), TaskMetadata::default());
            }
        }

        // Documents without a recorded root fall back to the "Finish" sink.
        let recorded = data
            .dag
            .graph
            .get(ROOT_GRAPH_KEY)
            .and_then(|v| v.as_str())
            .filter(|id| dag.contains_node(id))
            .map(str::to_string);
        let root = recorded.or_else(|| {
            metadata
                .iter()
                .filter(|(id, meta)| {
                    meta.name.as_deref() == Some(ROOT_TASK_NAME)
                        && dag.contains_node(id)
                        && dag.successors(id).is_empty()
                })
                .map(|(id, _)| id.clone())
                .next()
        });

        let mut project = Self {
            name: data.name,
            dag,
            metadata,
            statistics: ProjectStatistics::default(),
            root,
        };
        project.update_statistics();
        Ok(project)
    }

    /// Parse a project document.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: ProjectData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn insert_task(&mut self, id: &str, meta: TaskMetadata) {
        self.dag.add_node(id);
        self.metadata.insert(id.to_string(), meta);
    }

    fn ensure_task(&self, task: &str) -> Result<()> {
        if self.dag.contains_node(task) && self.metadata.contains_key(task) {
            Ok(())
        } else {
            Err(TaskGraphError::not_found(EntityKind::Task, task))
        }
    }

    fn task_mut(&mut self, task: &str) -> Result<&mut TaskMetadata> {
        if !self.dag.contains_node(task) {
            return Err(TaskGraphError::not_found(EntityKind::Task, task));
        }
        self.metadata
            .get_mut(task)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Task, task))
    }

    #[cfg(test)]
    pub(crate) fn insert_orphan_metadata(&mut self, id: &str) {
        self.metadata.insert(id.to_string(), TaskMetadata::default());
    }
}

fn issue_mut<'a>(meta: &'a mut TaskMetadata, issue: &str) -> Result<&'a mut Issue> {
    meta.issues
        .get_mut(issue)
        .ok_or_else(|| TaskGraphError::not_found(EntityKind::Issue, issue))
}
