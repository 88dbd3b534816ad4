//! Bounded buffer of events received by the collection endpoint.

use nexus_core::EnrichedEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use telemetry::metrics;

/// Keeps the most recent `capacity` events; older events are evicted first.
pub struct EventBuffer {
    events: Mutex<VecDeque<EnrichedEvent>>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Append an event. Returns `true` if an older event was evicted.
    pub fn push(&self, event: EnrichedEvent) -> bool {
        let mut events = self.events.lock();
        let evicted = if events.len() >= self.capacity {
            events.pop_front();
            true
        } else {
            false
        };
        events.push_back(event);
        metrics().buffered_events.set(events.len() as u64);
        evicted
    }

    /// Up to `limit` most recent events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<EnrichedEvent> {
        let events = self.events.lock();
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        metrics().buffered_events.set(0);
    }
}
