// src/engine/queue.rs

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{EventId, EventKind, EventPayload};
use crate::types::Timestamp;

/// One heap entry. Ordered by timestamp, then event id.
pub type QueuedEvent = (Timestamp, EventId, EventKind);

/// Persisted form of the scheduler queue.
///
/// `event_heap` holds `[timestamp, event_id, kind]` triples in heap order;
/// `event_map` maps each event id to its target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerData {
    #[serde(default)]
    pub event_heap: Vec<QueuedEvent>,
    #[serde(default)]
    pub event_map: BTreeMap<EventId, EventPayload>,
}

/// Min-priority queue of scheduled events plus the payload side-table.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<QueuedEvent>>,
    payloads: HashMap<EventId, EventPayload>,
    next_id: EventId,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Insert an event and return its freshly assigned id.
    pub fn push(&mut self, timestamp: Timestamp, kind: EventKind, payload: EventPayload) -> EventId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.heap.push(Reverse((timestamp, id, kind)));
        self.payloads.insert(id, payload);
        debug!(event = id, %timestamp, ?kind, "queued event");
        id
    }

    /// Earliest event, without removing it.
    pub fn peek(&self) -> Option<QueuedEvent> {
        self.heap.peek().map(|Reverse(e)| *e)
    }

    /// Remove the earliest event and return it with its payload.
    pub fn pop(&mut self) -> Option<(QueuedEvent, Option<EventPayload>)> {
        let Reverse(event) = self.heap.pop()?;
        let payload = self.payloads.remove(&event.1);
        Some((event, payload))
    }

    pub fn payload(&self, id: EventId) -> Option<&EventPayload> {
        self.payloads.get(&id)
    }

    /// Snapshot for persistence.
    pub fn to_data(&self) -> SchedulerData {
        let mut event_heap: Vec<QueuedEvent> = self.heap.iter().map(|Reverse(e)| *e).collect();
        event_heap.sort();
        SchedulerData {
            event_heap,
            event_map: self
                .payloads
                .iter()
                .map(|(id, p)| (*id, p.clone()))
                .collect(),
        }
    }

    /// Rebuild from a persisted snapshot. Ids continue after the largest one
    /// seen; payloads with no heap entry are dropped.
    pub fn from_data(data: SchedulerData) -> Self {
        let mut payloads: HashMap<EventId, EventPayload> = data.event_map.into_iter().collect();
        let mut heap = BinaryHeap::with_capacity(data.event_heap.len());
        let mut queued = HashSet::with_capacity(data.event_heap.len());
        let mut next_id: EventId = 0;

        for event in data.event_heap {
            queued.insert(event.1);
            if !payloads.contains_key(&event.1) {
                warn!(event = event.1, "scheduled event has no payload");
            }
            next_id = next_id.max(event.1.saturating_add(1));
            heap.push(Reverse(event));
        }

        let before = payloads.len();
        payloads.retain(|id, _| queued.contains(id));
        if payloads.len() < before {
            warn!(dropped = before - payloads.len(), "dropped payloads without a queued event");
        }

        Self {
            heap,
            payloads,
            next_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn pops_in_time_then_id_order() {
        let t0 = Utc::now();
        let mut q = EventQueue::new();
        let late = q.push(t0 + Duration::seconds(5), EventKind::WakeUp, EventPayload::new("p", "late"));
        let first = q.push(t0, EventKind::WakeUp, EventPayload::new("p", "first"));
        let second = q.push(t0, EventKind::WakeUp, EventPayload::new("p", "second"));

        let order: Vec<EventId> = std::iter::from_fn(|| q.pop().map(|(e, _)| e.1)).collect();
        assert_eq!(order, vec![first, second, late]);
        assert!(q.is_empty());
    }

    #[test]
    fn restored_queue_continues_ids() {
        let t0 = Utc::now();
        let mut q = EventQueue::new();
        q.push(t0, EventKind::WakeUp, EventPayload::new("p", "a"));
        q.push(t0, EventKind::WakeUp, EventPayload::new("p", "b"));

        let mut restored = EventQueue::from_data(q.to_data());
        assert_eq!(restored.len(), 2);
        let id = restored.push(t0, EventKind::WakeUp, EventPayload::new("p", "c"));
        assert_eq!(id, 2);
    }

    #[test]
    fn restoring_the_largest_event_id_does_not_overflow() {
        let mut data = SchedulerData::default();
        data.event_heap.push((Utc::now(), EventId::MAX, EventKind::WakeUp));
        data.event_map.insert(EventId::MAX, EventPayload::new("p", "t"));

        let q = EventQueue::from_data(data);
        assert_eq!(q.len(), 1);
        assert_eq!(q.payload(EventId::MAX).map(|p| p.task_id.as_str()), Some("t"));
    }

    #[test]
    fn orphan_payloads_are_dropped_on_restore() {
        let mut data = SchedulerData::default();
        data.event_map.insert(7, EventPayload::new("p", "t"));
        let q = EventQueue::from_data(data);
        assert!(q.is_empty());
        assert!(q.payload(7).is_none());
    }

    #[test]
    fn persisted_shape_uses_triples_and_snake_case_kind() {
        let t0 = Utc::now();
        let mut q = EventQueue::new();
        q.push(t0, EventKind::WakeUp, EventPayload::new("p", "t"));

        let json = serde_json::to_value(q.to_data()).unwrap();
        let entry = &json["event_heap"][0];
        assert_eq!(entry[1], 0);
        assert_eq!(entry[2], "wake_up");
        assert_eq!(json["event_map"]["0"]["task_id"], "t");
    }
}
