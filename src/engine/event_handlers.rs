// src/engine/event_handlers.rs

//! Handlers run by the scheduler core when an event fires.

use tracing::{debug, warn};

use crate::dag::TaskGraph;
use crate::engine::{EventId, EventKind, EventPayload};
use crate::errors::Result;
use crate::types::Timestamp;

/// What firing a wake-up event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeUpOutcome {
    /// The task was re-resolved (its status may or may not have changed).
    Resolved,
    /// The referenced project no longer exists.
    ProjectGone,
    /// The referenced task no longer exists in its project.
    TaskGone,
    /// The event had no payload to act on.
    MissingPayload,
}

/// Record of one fired event, returned by the core to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredEvent {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub kind: EventKind,
    pub outcome: WakeUpOutcome,
}

/// Dispatch a fired event by kind.
pub fn handle_event(
    graph: &mut TaskGraph,
    id: EventId,
    kind: EventKind,
    payload: Option<&EventPayload>,
    now: Timestamp,
) -> Result<WakeUpOutcome> {
    let Some(payload) = payload else {
        warn!(event = id, ?kind, "fired event has no payload; dropping");
        return Ok(WakeUpOutcome::MissingPayload);
    };

    match kind {
        EventKind::WakeUp => handle_wake_up(graph, payload, now),
    }
}

/// Re-resolve the task referenced by a wake-up event.
///
/// A stale target (project or task removed since scheduling) is not an
/// error: it is logged and reported through the outcome.
pub fn handle_wake_up(
    graph: &mut TaskGraph,
    payload: &EventPayload,
    now: Timestamp,
) -> Result<WakeUpOutcome> {
    let Ok(project) = graph.get_project_mut(&payload.project_id) else {
        warn!(
            project = %payload.project_id,
            task = %payload.task_id,
            "wake-up for a project that no longer exists"
        );
        return Ok(WakeUpOutcome::ProjectGone);
    };

    if !project.contains_task(&payload.task_id) {
        warn!(
            project = %payload.project_id,
            task = %payload.task_id,
            "wake-up for a task that no longer exists"
        );
        return Ok(WakeUpOutcome::TaskGone);
    }

    project.resolve_dependency_at(&payload.task_id, now)?;
    debug!(
        project = %payload.project_id,
        task = %payload.task_id,
        status = ?project.task(&payload.task_id).map(|m| m.status),
        "wake-up resolved task"
    );
    Ok(WakeUpOutcome::Resolved)
}
