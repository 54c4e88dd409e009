// src/store/database.rs

//! Hash-gated persistence of the task graph and the scheduler queue.
//!
//! Layout under the database root:
//!
//! ```text
//! <root>/projects.json          {project_id: {name, status}}
//! <root>/projects/<id>.json     {name, DAG, metadata}
//! <root>/scheduler.json         {event_heap, event_map}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::dag::{ProjectSummary, TaskGraph, TaskGraphProject};
use crate::engine::{EventScheduler, SchedulerData};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::store::hash::{compute_data_hash, HashStore, MemoryHashStore};
use crate::types::ProjectId;

pub const INDEX_FILE: &str = "projects.json";
pub const PROJECTS_DIR: &str = "projects";
pub const SCHEDULER_FILE: &str = "scheduler.json";

/// Counts from one `save_database` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: usize,
    pub skipped: usize,
}

/// Reads and writes the persisted database through a [`FileSystem`].
///
/// The graph and scheduler are passed in per call; the manager only owns the
/// filesystem handle and the last-written hash of each project and of the
/// scheduler queue.
#[derive(Debug)]
pub struct DatabaseManager<F: FileSystem = RealFileSystem> {
    fs: F,
    root: PathBuf,
    hashes: MemoryHashStore,
    scheduler_hash: Option<String>,
}

impl<F: FileSystem> DatabaseManager<F> {
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
            hashes: MemoryHashStore::new(),
            scheduler_hash: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn project_path(&self, id: &str) -> PathBuf {
        self.root.join(PROJECTS_DIR).join(format!("{id}.json"))
    }

    pub fn scheduler_path(&self) -> PathBuf {
        self.root.join(SCHEDULER_FILE)
    }

    /// Hash recorded at the last write (or load) of `id`.
    pub fn stored_hash(&self, id: &str) -> Option<String> {
        self.hashes.load(id)
    }

    /// Persist one project. Returns `true` if the file was written.
    ///
    /// With `check_hash`, a project whose content hash matches the one
    /// recorded at its last write is skipped.
    pub fn save_project(&mut self, graph: &mut TaskGraph, id: &str, check_hash: bool) -> Result<bool> {
        let project = graph.get_project_mut(id)?;

        if check_hash {
            let current = project.get_data_hash()?;
            if self.hashes.load(id).as_deref() == Some(current.as_str()) {
                debug!(project = %id, "project unchanged; skipping write");
                return Ok(false);
            }
        }

        project.purge_metadata();
        let json = project.serialize()?;
        let hash = compute_data_hash(json.as_bytes());
        self.fs.write(&self.project_path(id), json.as_bytes())?;
        self.hashes.save(id, &hash);

        info!(project = %id, "saved project");
        Ok(true)
    }

    /// Save every project (hash-gated when `check_hash`), then the index.
    pub fn save_database(&mut self, graph: &mut TaskGraph, check_hash: bool) -> Result<SaveReport> {
        let ids: Vec<ProjectId> = graph.project_ids().cloned().collect();
        let mut report = SaveReport::default();

        for id in &ids {
            if self.save_project(graph, id, check_hash)? {
                report.written += 1;
            } else {
                report.skipped += 1;
            }
        }

        let active: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.hashes.prune(&active);
        self.save_index(graph)?;

        debug!(written = report.written, skipped = report.skipped, "saved database");
        Ok(report)
    }

    /// Write the project index with freshly computed statuses.
    pub fn save_index(&self, graph: &mut TaskGraph) -> Result<()> {
        let index = graph.get_data();
        let json = serde_json::to_string_pretty(&index)?;
        self.fs.write(&self.index_path(), json.as_bytes())?;
        Ok(())
    }

    /// Load every project listed in the index into `graph`. Returns the
    /// number of projects loaded.
    ///
    /// A missing index is created empty. A listed project whose file is
    /// missing or malformed is logged and skipped; the index is not rewritten.
    pub fn load_database(&mut self, graph: &mut TaskGraph) -> Result<usize> {
        let index_path = self.index_path();
        if !self.fs.exists(&index_path) {
            warn!(path = ?index_path, "no project index found; creating an empty one");
            self.fs.write(&index_path, b"{}")?;
            return Ok(0);
        }

        let index: BTreeMap<ProjectId, ProjectSummary> =
            serde_json::from_str(&self.fs.read_to_string(&index_path)?)?;

        let mut loaded = 0;
        for (id, summary) in index {
            match self.load_project(&id) {
                Ok(Some(project)) => {
                    let hash = project.get_data_hash()?;
                    self.hashes.save(&id, &hash);
                    graph.insert_project(id, project);
                    loaded += 1;
                }
                Ok(None) => {
                    error!(project = %id, name = %summary.name, "project listed in index has no file; skipping");
                }
                Err(e) => {
                    error!(project = %id, name = %summary.name, error = %e, "failed to load project; skipping");
                }
            }
        }

        info!(loaded, "loaded database");
        Ok(loaded)
    }

    /// Read one project file. `Ok(None)` if the file does not exist.
    pub fn load_project(&self, id: &str) -> Result<Option<TaskGraphProject>> {
        let path = self.project_path(id);
        if !self.fs.is_file(&path) {
            return Ok(None);
        }
        let json = self.fs.read_to_string(&path)?;
        Ok(Some(TaskGraphProject::from_json(&json)?))
    }

    /// Remove a project from the graph and from disk, then rewrite the index.
    pub fn delete_project(&mut self, graph: &mut TaskGraph, id: &str) -> Result<TaskGraphProject> {
        let project = graph.remove_project(id)?;
        self.fs.remove_file(&self.project_path(id))?;
        self.hashes.remove(id);
        self.save_index(graph)?;
        info!(project = %id, "deleted project");
        Ok(project)
    }

    /// Persist the scheduler queue. Returns `true` if the file was written.
    ///
    /// With `check_hash`, a queue identical to the last one written (or
    /// loaded) is skipped.
    pub fn save_scheduler_database(&mut self, scheduler: &EventScheduler, check_hash: bool) -> Result<bool> {
        let json = serde_json::to_string_pretty(&scheduler.to_data())?;
        let hash = compute_data_hash(json.as_bytes());
        if check_hash && self.scheduler_hash.as_deref() == Some(hash.as_str()) {
            debug!("scheduler queue unchanged; skipping write");
            return Ok(false);
        }

        self.fs.write(&self.scheduler_path(), json.as_bytes())?;
        self.scheduler_hash = Some(hash);
        debug!(events = scheduler.len(), "saved scheduler database");
        Ok(true)
    }

    /// Read the scheduler queue. A missing file yields an empty scheduler.
    pub fn load_scheduler_database(&mut self) -> Result<EventScheduler> {
        let path = self.scheduler_path();
        if !self.fs.exists(&path) {
            warn!(path = ?path, "no scheduler database found; starting with an empty queue");
            return Ok(EventScheduler::new());
        }
        let data: SchedulerData = serde_json::from_str(&self.fs.read_to_string(&path)?)?;
        let scheduler = EventScheduler::from_data(data);
        let json = serde_json::to_string_pretty(&scheduler.to_data())?;
        self.scheduler_hash = Some(compute_data_hash(json.as_bytes()));
        info!(events = scheduler.len(), "loaded scheduler database");
        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn manager() -> (DatabaseManager<MockFileSystem>, MockFileSystem) {
        let fs = MockFileSystem::new();
        (DatabaseManager::new(fs.clone(), "db"), fs)
    }

    #[test]
    fn unchanged_projects_are_not_rewritten() {
        let (mut db, fs) = manager();
        let mut graph = TaskGraph::new();
        graph.new_project("alpha");
        graph.new_project("beta");

        let first = db.save_database(&mut graph, true).unwrap();
        assert_eq!(first, SaveReport { written: 2, skipped: 0 });

        fs.reset_write_count();
        let second = db.save_database(&mut graph, true).unwrap();
        assert_eq!(second, SaveReport { written: 0, skipped: 2 });
        assert_eq!(fs.writes_under("db/projects"), 0);
    }

    #[test]
    fn forced_save_ignores_hashes() {
        let (mut db, fs) = manager();
        let mut graph = TaskGraph::new();
        let id = graph.new_project("alpha");

        db.save_project(&mut graph, &id, true).unwrap();
        fs.reset_write_count();
        assert!(db.save_project(&mut graph, &id, false).unwrap());
        assert_eq!(fs.writes_under("db/projects"), 1);
    }

    #[test]
    fn missing_index_is_created() {
        let (mut db, fs) = manager();
        let mut graph = TaskGraph::new();
        assert_eq!(db.load_database(&mut graph).unwrap(), 0);
        assert_eq!(fs.read_to_string(Path::new("db/projects.json")).unwrap(), "{}");
    }

    #[test]
    fn missing_and_malformed_project_files_are_skipped() {
        let (mut db, fs) = manager();
        let mut graph = TaskGraph::new();
        let good = graph.new_project("good");
        db.save_database(&mut graph, false).unwrap();

        let index = r#"{
            "GOOD": {"name": "good", "status": "active"},
            "gone": {"name": "gone", "status": "active"},
            "bad": {"name": "bad", "status": "active"}
        }"#
        .replace("GOOD", &good);
        fs.add_file("db/projects.json", index);
        fs.add_file("db/projects/bad.json", "{not json");

        let mut restored = TaskGraph::new();
        assert_eq!(db.load_database(&mut restored).unwrap(), 1);
        assert!(restored.contains_project(&good));
        assert!(!restored.contains_project("gone"));
        assert!(!restored.contains_project("bad"));
    }

    #[test]
    fn delete_project_removes_file_and_index_entry() {
        let (mut db, fs) = manager();
        let mut graph = TaskGraph::new();
        let id = graph.new_project("alpha");
        db.save_database(&mut graph, true).unwrap();

        db.delete_project(&mut graph, &id).unwrap();
        assert!(!fs.exists(&db.project_path(&id)));
        assert!(db.stored_hash(&id).is_none());
        assert_eq!(fs.read_to_string(&db.index_path()).unwrap(), "{}");
        assert!(db.delete_project(&mut graph, &id).unwrap_err().is_not_found());
    }

    #[test]
    fn missing_scheduler_file_gives_empty_queue() {
        let (mut db, _fs) = manager();
        assert!(db.load_scheduler_database().unwrap().is_empty());
    }

    #[test]
    fn unchanged_scheduler_queue_is_not_rewritten() {
        let (mut db, fs) = manager();
        let mut scheduler = EventScheduler::new();
        let at = chrono::Utc::now() + chrono::Duration::hours(1);
        scheduler.schedule_wake_up("p", "t", at);

        assert!(db.save_scheduler_database(&scheduler, true).unwrap());
        fs.reset_write_count();
        assert!(!db.save_scheduler_database(&scheduler, true).unwrap());
        assert_eq!(fs.write_count(), 0);

        scheduler.schedule_wake_up("p", "u", at);
        assert!(db.save_scheduler_database(&scheduler, true).unwrap());
        assert!(db.save_scheduler_database(&scheduler, false).unwrap());
        assert_eq!(fs.write_count(), 2);

        let mut reloaded = DatabaseManager::new(fs.clone(), "db");
        assert_eq!(reloaded.load_scheduler_database().unwrap().len(), 2);
        assert!(!reloaded.save_scheduler_database(&scheduler, true).unwrap());
    }
}
