//! `StreamConnector` — owns the subscription lifecycle.
//!
//! One background task per connector: subscribe, drain frames, and on any
//! session loss sleep a fixed delay and subscribe again, indefinitely.
//! Failures never surface as errors to the host; the worst observable
//! state is "offline, no new events" (`is_online()`).

use crate::config::ConnectorConfig;
use crate::listener::TopicListener;
use fraudfeed_core::{decode_frame, TransactionScoreEvent};
use futures::StreamExt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the connector delivers to its single downstream consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A session was (re)established and the subscription issued.
    /// A non-first `SessionUp` means reconnect: accumulated state resets.
    SessionUp,
    /// The session was lost; the retry loop is about to kick in.
    SessionDown,
    /// One decoded inbound frame, in arrival order.
    Batch(Vec<TransactionScoreEvent>),
}

/// Reconnecting subscription to one transaction-score topic.
///
/// State machine: Idle → Connecting → Subscribed → (Disconnected →
/// Connecting)*; only `disconnect()` returns to Idle. There is no error
/// terminal state.
pub struct StreamConnector {
    config: ConnectorConfig,
    listener: Arc<dyn TopicListener>,
    tx: mpsc::Sender<StreamEvent>,
    online: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StreamConnector {
    /// Build a connector around `listener`. Returns the connector plus the
    /// receiver side of the event channel — the one registered handler.
    pub fn new(
        config: ConnectorConfig,
        listener: Arc<dyn TopicListener>,
    ) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let connector = Self {
            config,
            listener,
            tx,
            online: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        };
        (connector, rx)
    }

    /// Start the session task. Idempotent: a second call while a task is
    /// live is a no-op. Never blocks on network I/O.
    pub fn connect(&self) {
        let mut task = self.task.lock().unwrap();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("connect() called while already connected; ignoring");
            return;
        }

        let listener = Arc::clone(&self.listener);
        let tx = self.tx.clone();
        let online = Arc::clone(&self.online);
        let retry_delay = self.config.retry_delay();
        *task = Some(tokio::spawn(async move {
            run_loop(listener, tx, online, retry_delay).await;
        }));
    }

    /// Tear down the session and cancel any in-flight retry timer.
    /// Safe to call twice, or before `connect()`. A later `connect()`
    /// starts a fresh session on the same event channel.
    pub fn disconnect(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            info!(topic = %self.listener.topic(), "stream connector disconnected");
        }
        self.online.store(false, Ordering::Relaxed);
    }

    /// Online/offline indicator; the only failure surface the host gets.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }
}

impl Drop for StreamConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Subscribe/drain/retry forever. Exits only when aborted by
/// `disconnect()` or when the consumer drops its receiver.
async fn run_loop(
    listener: Arc<dyn TopicListener>,
    tx: mpsc::Sender<StreamEvent>,
    online: Arc<AtomicBool>,
    retry_delay: Duration,
) {
    loop {
        match listener.subscribe().await {
            Err(e) => {
                warn!("subscribe failed: {e}; retrying in {retry_delay:?}");
                online.store(false, Ordering::Relaxed);
                tokio::time::sleep(retry_delay).await;
            }
            Ok(mut stream) => {
                online.store(true, Ordering::Relaxed);
                if tx.send(StreamEvent::SessionUp).await.is_err() {
                    return;
                }

                while let Some(item) = stream.next().await {
                    match item {
                        Err(e) => {
                            warn!("stream error: {e}");
                            break; // reconnect
                        }
                        Ok(body) => match decode_frame(&body) {
                            Ok(events) => {
                                if tx.send(StreamEvent::Batch(events)).await.is_err() {
                                    return;
                                }
                            }
                            // Lossy by contract: the frame is dropped, not surfaced.
                            Err(e) => debug!("undecodable frame dropped: {e}"),
                        },
                    }
                }

                online.store(false, Ordering::Relaxed);
                if tx.send(StreamEvent::SessionDown).await.is_err() {
                    return;
                }
                info!("stream closed; reconnecting in {retry_delay:?}");
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}
