//! Bounded window of recent health events
//!
//! The window is the only mutable ingestion state in the process. It keeps
//! the newest events up to a fixed capacity, evicting the oldest first, and
//! tracks running counters that reset only when a remediation cycle
//! completes.

use crate::models::HealthEvent;
use serde::Serialize;
use std::collections::VecDeque;

/// Maximum number of events retained for analysis
pub const WINDOW_CAPACITY: usize = 30;

/// Running counters maintained alongside the event window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowCounters {
    pub total_count: u64,
    pub error_count: u64,
}

/// FIFO buffer of recent health events with error accounting
pub struct EventWindow {
    events: VecDeque<HealthEvent>,
    capacity: usize,
    counters: WindowCounters,
}

impl EventWindow {
    /// Create a window with the standard capacity
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    /// Create a window with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            counters: WindowCounters::default(),
        }
    }

    /// Append an event, evicting the oldest past capacity. Always succeeds.
    pub fn ingest(&mut self, event: HealthEvent) {
        self.counters.total_count += 1;
        if event.is_error() {
            self.counters.error_count += 1;
        }

        self.events.push_back(event);
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
    }

    /// Owned copy of the current sequence, oldest first.
    ///
    /// Analysis runs against the copy so it never observes mutation
    /// mid-computation.
    pub fn snapshot(&self) -> Vec<HealthEvent> {
        self.events.iter().cloned().collect()
    }

    /// Clear events and both counters.
    ///
    /// Called only by the orchestrator after a completed remediation cycle.
    pub fn reset(&mut self) {
        self.events.clear();
        self.counters = WindowCounters::default();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn counters(&self) -> WindowCounters {
        self.counters
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        Self::new()
    }
}
