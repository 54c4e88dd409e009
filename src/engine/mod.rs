// src/engine/mod.rs

//! Time-based event scheduler.
//!
//! The pure core ([`core::EventScheduler`]) owns the priority queue and fires
//! due events against a [`TaskGraph`](crate::dag::TaskGraph) given an explicit
//! clock. The async shell ([`runtime`]) drives it on a two-tier cadence: a
//! short wait while due events are being drained, a long wait while idle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, TaskId};

/// Scheduler-assigned event identifier. Monotonic; breaks timestamp ties.
pub type EventId = u64;

/// What a scheduled event does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Re-resolve the referenced task.
    WakeUp,
}

/// Target of a scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub project_id: ProjectId,
    pub task_id: TaskId,
}

impl EventPayload {
    pub fn new(project_id: impl Into<ProjectId>, task_id: impl Into<TaskId>) -> Self {
        Self {
            project_id: project_id.into(),
            task_id: task_id.into(),
        }
    }
}

/// Cadence of the scheduler tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Wait between consecutive due events.
    pub drain_interval: Duration,
    /// Wait once no event is due.
    pub idle_interval: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_millis(100),
            idle_interval: Duration::from_millis(1000),
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use self::core::EventScheduler;
pub use event_handlers::{FiredEvent, WakeUpOutcome};
pub use queue::{EventQueue, SchedulerData};
pub use runtime::run_scheduler_loop;
