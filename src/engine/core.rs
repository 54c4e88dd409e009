// src/engine/core.rs

//! Pure scheduler core.
//!
//! Owns the event queue and fires due events against a task graph. It takes
//! the current time as an argument and performs no IO, so the firing rules
//! can be tested without Tokio or a clock.

use tracing::{debug, error};

use crate::dag::TaskGraph;
use crate::engine::event_handlers::{handle_event, FiredEvent};
use crate::engine::queue::{EventQueue, QueuedEvent, SchedulerData};
use crate::engine::{EventId, EventKind, EventPayload};
use crate::errors::Result;
use crate::types::Timestamp;

#[derive(Debug, Default)]
pub struct EventScheduler {
    queue: EventQueue,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: SchedulerData) -> Self {
        Self {
            queue: EventQueue::from_data(data),
        }
    }

    pub fn to_data(&self) -> SchedulerData {
        self.queue.to_data()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Earliest queued event.
    pub fn peek(&self) -> Option<QueuedEvent> {
        self.queue.peek()
    }

    pub fn payload(&self, id: EventId) -> Option<&EventPayload> {
        self.queue.payload(id)
    }

    /// Queue an event for `timestamp` and return its id.
    pub fn schedule(&mut self, timestamp: Timestamp, kind: EventKind, payload: EventPayload) -> EventId {
        self.queue.push(timestamp, kind, payload)
    }

    /// Queue a wake-up of `(project_id, task_id)` at `at`.
    pub fn schedule_wake_up(
        &mut self,
        project_id: impl Into<String>,
        task_id: impl Into<String>,
        at: Timestamp,
    ) -> EventId {
        self.schedule(at, EventKind::WakeUp, EventPayload::new(project_id, task_id))
    }

    /// True if the earliest event is due at `now`.
    pub fn has_due(&self, now: Timestamp) -> bool {
        self.queue.peek().is_some_and(|(ts, _, _)| ts <= now)
    }

    /// Fire the earliest event if it is due at `now`.
    ///
    /// The event leaves the queue only after its handler returns, and it
    /// leaves it whatever the handler's result; a failing handler's error is
    /// returned after the event has been consumed.
    pub fn fire_next_due(&mut self, graph: &mut TaskGraph, now: Timestamp) -> Result<Option<FiredEvent>> {
        let Some((timestamp, id, kind)) = self.queue.peek() else {
            return Ok(None);
        };
        if timestamp > now {
            return Ok(None);
        }

        let outcome = handle_event(graph, id, kind, self.queue.payload(id), now);
        self.queue.pop();

        let outcome = outcome?;
        debug!(event = id, %timestamp, ?kind, ?outcome, "fired event");
        Ok(Some(FiredEvent {
            id,
            timestamp,
            kind,
            outcome,
        }))
    }

    /// Fire every event due at `now`. Handler failures are logged and do not
    /// stop the drain.
    pub fn fire_due(&mut self, graph: &mut TaskGraph, now: Timestamp) -> Vec<FiredEvent> {
        let mut fired = Vec::new();
        while self.has_due(now) {
            match self.fire_next_due(graph, now) {
                Ok(Some(event)) => fired.push(event),
                Ok(None) => break,
                Err(e) => error!(error = %e, "scheduled event failed"),
            }
        }
        fired
    }
}
