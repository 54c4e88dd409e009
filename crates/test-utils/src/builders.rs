#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use taskgraph::config::{ConfigFile, DatabaseSection, RawConfigFile, SchedulerSection};
use taskgraph::dag::{TaskGraphProject, TaskMetadata};
use taskgraph::types::{TaskId, TaskStatus};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                database: DatabaseSection::default(),
                scheduler: SchedulerSection::default(),
            },
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.database.root_path = root.into();
        self
    }

    pub fn with_autosave_secs(mut self, secs: u64) -> Self {
        self.config.database.autosave_interval_secs = secs;
        self
    }

    pub fn with_intervals_ms(mut self, drain: u64, idle: u64) -> Self {
        self.config.scheduler.drain_interval_ms = drain;
        self.config.scheduler.idle_interval_ms = idle;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Label of the project's root task in a [`ProjectBuilder`].
pub const ROOT: &str = "root";

/// A built project plus the ids of its tasks, keyed by builder label.
pub struct BuiltProject {
    pub project: TaskGraphProject,
    pub ids: HashMap<String, TaskId>,
}

impl BuiltProject {
    pub fn id(&self, label: &str) -> &str {
        self.ids
            .get(label)
            .unwrap_or_else(|| panic!("no task labelled {label:?}"))
    }

    pub fn status(&self, label: &str) -> TaskStatus {
        self.project
            .task(self.id(label))
            .unwrap_or_else(|| panic!("task {label:?} is gone"))
            .status
    }
}

/// Builds a project from labelled tasks so tests can refer to them by name.
///
/// ```ignore
/// let built = ProjectBuilder::new("demo")
///     .sub_task("a", ROOT)
///     .sub_task("b", "a")
///     .done("b")
///     .build();
/// ```
pub struct ProjectBuilder {
    built: BuiltProject,
}

impl ProjectBuilder {
    pub fn new(name: &str) -> Self {
        let project = TaskGraphProject::new(name);
        let root = project
            .root_task()
            .expect("new project has a root task")
            .to_string();
        let mut ids = HashMap::new();
        ids.insert(ROOT.to_string(), root);
        Self {
            built: BuiltProject { project, ids },
        }
    }

    /// Add task `label` that `parent` depends on.
    pub fn sub_task(mut self, label: &str, parent: &str) -> Self {
        let parent = self.built.id(parent).to_string();
        let id = self
            .built
            .project
            .add_sub_task(&parent, Some(TaskMetadata::named(label)))
            .expect("add_sub_task");
        self.built.ids.insert(label.to_string(), id);
        self
    }

    /// Add task `label` that depends on `child`.
    pub fn super_task(mut self, label: &str, child: &str) -> Self {
        let child = self.built.id(child).to_string();
        let id = self
            .built
            .project
            .add_super_task(&child, Some(TaskMetadata::named(label)))
            .expect("add_super_task");
        self.built.ids.insert(label.to_string(), id);
        self
    }

    /// Make `task` depend on `dep` and resolve `task`.
    pub fn depends(mut self, task: &str, dep: &str) -> Self {
        let task = self.built.id(task).to_string();
        let dep = self.built.id(dep).to_string();
        self.built
            .project
            .add_dependency(&task, &dep)
            .expect("add_dependency");
        self.built
            .project
            .resolve_dependency(&task)
            .expect("resolve_dependency");
        self
    }

    pub fn done(mut self, label: &str) -> Self {
        let id = self.built.id(label).to_string();
        self.built.project.task_done(&id).expect("task_done");
        self
    }

    pub fn build(self) -> BuiltProject {
        self.built
    }
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new("test")
    }
}
