// src/dag/metadata.rs

//! Per-task metadata and issue records.
//!
//! Every optional field is omitted from the serialized form when unset and
//! treated as unset when absent on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{IssueId, IssueStatus, TaskStatus, Timestamp};

/// Metadata attached to every task node of a project DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default = "default_status")]
    pub status: TaskStatus,

    /// Only meaningful while `status == Snoozed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_after: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snooze_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_after: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modify: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_done: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub issues: BTreeMap<IssueId, Issue>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Active
}

impl Default for TaskMetadata {
    fn default() -> Self {
        Self {
            name: None,
            detail: None,
            status: default_status(),
            wake_after: None,
            snooze_reason: None,
            remind_after: None,
            last_modify: None,
            time_done: None,
            issues: BTreeMap::new(),
        }
    }
}

impl TaskMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Drop the snooze bookkeeping once the task is no longer snoozed.
    pub(crate) fn clear_snooze(&mut self) {
        self.wake_after = None;
        self.snooze_reason = None;
    }
}

/// Partial update of a task's descriptive fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub detail: Option<String>,
    pub remind_after: Option<Timestamp>,
}

/// A lightweight sub-problem owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,

    #[serde(default)]
    pub status: IssueStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_close: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_modify: Option<Timestamp>,
}

impl Issue {
    pub fn open(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: IssueStatus::Open,
            description: None,
            labels: None,
            close_reason: None,
            time_close: None,
            time_modify: None,
        }
    }
}

/// Fields supplied when opening or modifying an issue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_are_omitted() {
        let meta = TaskMetadata::named("write docs");
        let json = serde_json::to_value(&meta).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(obj["name"], "write docs");
        assert_eq!(obj["status"], "active");
    }

    #[test]
    fn absent_fields_read_as_unset() {
        let meta: TaskMetadata = serde_json::from_str(r#"{"status": "pending"}"#).unwrap();
        assert_eq!(meta.status, TaskStatus::Pending);
        assert!(meta.name.is_none());
        assert!(meta.wake_after.is_none());
        assert!(meta.issues.is_empty());

        let meta: TaskMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(meta.status, TaskStatus::Active);
    }

    #[test]
    fn issue_defaults_to_open() {
        let issue: Issue = serde_json::from_str(r#"{"title": "flaky test"}"#).unwrap();
        assert_eq!(issue.status, IssueStatus::Open);
        assert!(issue.labels.is_none());
    }
}
