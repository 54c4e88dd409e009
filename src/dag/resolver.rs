// src/dag/resolver.rs

//! Status resolution: the decision procedure that derives a task's status
//! from its own timing fields and the statuses of its direct predecessors.
//!
//! Rules, first match wins:
//! 1. a task that no longer exists is skipped (handled by the caller);
//! 2. `Done` is sticky;
//! 3. `Snoozed` stays snoozed until `wake_after` has passed, then falls
//!    through to rule 4;
//! 4. `Active` if every predecessor is `Done`, otherwise `Pending`.

use crate::dag::metadata::TaskMetadata;
use crate::errors::{Result, TaskGraphError};
use crate::types::{TaskStatus, Timestamp};

/// Outcome of resolving a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Leave the task untouched (done, or still snoozed).
    Keep,
    /// Write this status. When leaving `Snoozed` the caller clears the
    /// snooze bookkeeping.
    Set(TaskStatus),
}

/// Decide the status of `meta` given its predecessors' statuses at `now`.
///
/// `predecessors` yields `None` for a predecessor without metadata; such a
/// predecessor never counts as done.
pub fn resolve_status<I>(meta: &TaskMetadata, predecessors: I, now: Timestamp) -> Result<Resolution>
where
    I: IntoIterator<Item = Option<TaskStatus>>,
{
    match meta.status {
        TaskStatus::Done => return Ok(Resolution::Keep),
        TaskStatus::Snoozed => {
            let wake_after = meta.wake_after.ok_or_else(|| {
                TaskGraphError::InvalidState("snoozed task has no wake_after time".to_string())
            })?;
            if now <= wake_after {
                return Ok(Resolution::Keep);
            }
        }
        TaskStatus::Active | TaskStatus::Pending => {}
    }

    let all_done = predecessors
        .into_iter()
        .all(|status| status == Some(TaskStatus::Done));

    Ok(Resolution::Set(if all_done {
        TaskStatus::Active
    } else {
        TaskStatus::Pending
    }))
}
