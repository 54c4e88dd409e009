// src/state.rs

//! Core state shared by the tick loops and the API boundary.
//!
//! All mutation goes through one `tokio::sync::Mutex`, so calls from the
//! scheduler loop, the autosave loop and external callers never overlap.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::dag::TaskGraph;
use crate::engine::{EventId, EventScheduler};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::store::{DatabaseManager, SaveReport};
use crate::types::Timestamp;

pub type SharedState<F = RealFileSystem> = Arc<Mutex<AppState<F>>>;

#[derive(Debug)]
pub struct AppState<F: FileSystem = RealFileSystem> {
    pub graph: TaskGraph,
    pub scheduler: EventScheduler,
    pub database: DatabaseManager<F>,
}

impl<F: FileSystem> AppState<F> {
    pub fn new(database: DatabaseManager<F>) -> Self {
        Self {
            graph: TaskGraph::new(),
            scheduler: EventScheduler::new(),
            database,
        }
    }

    pub fn into_shared(self) -> SharedState<F> {
        Arc::new(Mutex::new(self))
    }

    /// Load projects and the scheduler queue from the database.
    pub fn load(&mut self) -> Result<usize> {
        let loaded = self.database.load_database(&mut self.graph)?;
        self.scheduler = self.database.load_scheduler_database()?;
        Ok(loaded)
    }

    /// Snooze a task and queue its wake-up at the same instant.
    pub fn snooze_task(
        &mut self,
        project_id: &str,
        task_id: &str,
        until: Timestamp,
        reason: Option<String>,
    ) -> Result<EventId> {
        self.graph
            .get_project_mut(project_id)?
            .task_snooze(task_id, until, reason)?;
        Ok(self.scheduler.schedule_wake_up(project_id, task_id, until))
    }

    /// Hash-gated save of every project and of the scheduler queue.
    pub fn autosave(&mut self) -> Result<SaveReport> {
        let report = self.database.save_database(&mut self.graph, true)?;
        self.database.save_scheduler_database(&self.scheduler, true)?;
        Ok(report)
    }

    /// Persist the scheduler queue, then force-write every project.
    pub fn save_all(&mut self) -> Result<SaveReport> {
        self.database.save_scheduler_database(&self.scheduler, false)?;
        let report = self.database.save_database(&mut self.graph, false)?;
        info!(projects = report.written, events = self.scheduler.len(), "saved all state");
        Ok(report)
    }
}
