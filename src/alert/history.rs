// Alert history - recent alert events, newest first on read

use super::{AlertEvent, AlertId};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Bounded store of recent alert events, in the order they were created
///
/// Events are recorded on creation and updated in place as they progress, so
/// both in-flight and finished events can be inspected. Only complete events
/// are evicted (oldest first); while more than `capacity` events are still
/// queued or in flight the history grows past its capacity.
pub struct AlertHistory {
    capacity: usize,
    events: Mutex<VecDeque<AlertEvent>>,
}

impl AlertHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Insert `event`, or replace the stored copy with the same ID in place
    pub fn record(&self, event: &AlertEvent) {
        let mut events = self.events.lock();

        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event.clone(),
            None => events.push_back(event.clone()),
        }

        while events.len() > self.capacity {
            let Some(index) = events.iter().position(AlertEvent::is_complete) else {
                break;
            };
            if let Some(evicted) = events.remove(index) {
                crate::debug!("[alert] Evicted alert {} from history", evicted.id);
            }
        }
    }

    pub fn get(&self, id: &AlertId) -> Option<AlertEvent> {
        self.events.lock().iter().find(|e| &e.id == id).cloned()
    }

    /// Events newest first
    pub fn recent(&self) -> Vec<AlertEvent> {
        self.events.lock().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
