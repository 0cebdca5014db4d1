//! `WindowAccumulator` — single writer over the bounded window.
//!
//! Consumes the connector's event channel and publishes immutable,
//! timestamp-sorted snapshots through a `watch` channel. Observers never
//! see the mutable buffer; all mutation is serialized through this task.

use crate::connector::StreamEvent;
use fraudfeed_core::{TransactionScoreEvent, Window};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Immutable published view of the window, sorted by timestamp.
pub type Snapshot = Arc<[TransactionScoreEvent]>;

/// Folds the event stream into a bounded window and publishes snapshots.
pub struct WindowAccumulator {
    window: Window,
    tx: watch::Sender<Snapshot>,
    seen_session: bool,
}

impl WindowAccumulator {
    /// Create an accumulator with the given window capacity, plus the
    /// observer handle. Clone the receiver for additional observers.
    pub fn new(capacity: usize) -> (Self, watch::Receiver<Snapshot>) {
        let (tx, rx) = watch::channel(Snapshot::from(Vec::new()));
        (
            Self {
                window: Window::new(capacity),
                tx,
                seen_session: false,
            },
            rx,
        )
    }

    /// Apply one stream event.
    ///
    /// A `Batch` appends and republishes; a reconnect (`SessionUp` after a
    /// previous session) clears the window — no replay or backfill is
    /// requested, so pre-disconnect state is discarded.
    pub fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Batch(events) => {
                if events.is_empty() {
                    return; // no-op, no republish
                }
                self.window.append(events);
                self.publish();
            }
            StreamEvent::SessionUp => {
                if self.seen_session && !self.window.is_empty() {
                    debug!("session re-established; clearing window");
                    self.window.clear();
                    self.publish();
                }
                self.seen_session = true;
            }
            StreamEvent::SessionDown => {}
        }
    }

    /// Drive the accumulator from a connector receiver until the channel
    /// closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<StreamEvent>) {
        while let Some(event) = rx.recv().await {
            self.apply(event);
        }
    }

    /// Current sorted view, independent of the publish channel.
    pub fn snapshot(&self) -> Vec<TransactionScoreEvent> {
        self.window.snapshot()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    fn publish(&self) {
        // No receivers is fine; the next subscriber sees the latest value.
        let _ = self.tx.send(Snapshot::from(self.window.snapshot()));
    }
}
