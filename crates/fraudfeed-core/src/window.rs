//! Bounded rolling window over the event stream.
//!
//! The window is ordered by *insertion*; eviction is strict FIFO on the
//! append sequence, never on timestamp. If frames arrive out of order the
//! earliest-appended records are still the ones dropped first. Consumers
//! only ever see [`Window::snapshot`], which re-sorts by timestamp.

use crate::event::TransactionScoreEvent;
use std::collections::VecDeque;

/// Default maximum number of retained events.
pub const DEFAULT_WINDOW_CAPACITY: usize = 5000;

/// Size-bounded, insertion-ordered working set of events.
#[derive(Debug, Clone)]
pub struct Window {
    events: VecDeque<TransactionScoreEvent>,
    capacity: usize,
}

impl Window {
    /// Create an empty window holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_WINDOW_CAPACITY)),
            capacity,
        }
    }

    /// Append zero or more events, evicting the oldest-inserted entries
    /// once the capacity is exceeded. Empty input is a no-op.
    ///
    /// No deduplication: the same transaction id delivered twice (e.g.
    /// reconnect overlap) is retained as two distinct entries.
    pub fn append(&mut self, events: impl IntoIterator<Item = TransactionScoreEvent>) {
        for event in events {
            if self.events.len() == self.capacity {
                self.events.pop_front();
            }
            self.events.push_back(event);
        }
    }

    /// The current buffer sorted ascending by timestamp. Non-destructive:
    /// repeated calls without an intervening `append` return equal
    /// sequences. Equal timestamps keep insertion order (stable sort).
    pub fn snapshot(&self) -> Vec<TransactionScoreEvent> {
        let mut out: Vec<_> = self.events.iter().cloned().collect();
        out.sort_by_key(|e| e.timestamp);
        out
    }

    /// Drop all retained events (session teardown / re-establishment).
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
