use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque task identifier (a UUID string for engine-generated tasks).
pub type TaskId = String;

/// Opaque project identifier.
pub type ProjectId = String;

/// Identifier carried by each dependency edge.
pub type EdgeId = String;

/// Identifier of an issue within its owning task.
pub type IssueId = String;

/// Wall-clock timestamp used for snoozes, reminders and bookkeeping.
pub type Timestamp = DateTime<Utc>;

/// Generate a fresh opaque identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Status of a single task.
///
/// - `Active`: every prerequisite is done; the task can be worked on.
/// - `Pending`: at least one prerequisite is not done yet.
/// - `Snoozed`: parked until `wake_after`.
/// - `Done`: completed. Sticky; resolution never leaves `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Done,
    Active,
    Pending,
    Snoozed,
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "done" => Ok(TaskStatus::Done),
            "active" => Ok(TaskStatus::Active),
            "pending" => Ok(TaskStatus::Pending),
            "snoozed" => Ok(TaskStatus::Snoozed),
            other => Err(format!(
                "invalid task status: {other} (expected \"done\", \"active\", \"pending\" or \"snoozed\")"
            )),
        }
    }
}

/// Derived status of a whole project. Never stored on its own; always
/// recomputed from the task statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Done,
    Active,
    Snoozed,
}

/// Status of an issue attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    #[default]
    Open,
    Closed,
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(IssueStatus::Open),
            "closed" => Ok(IssueStatus::Closed),
            other => Err(format!(
                "invalid issue status: {other} (expected \"open\" or \"closed\")"
            )),
        }
    }
}
