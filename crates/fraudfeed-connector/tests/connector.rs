//! Connector lifecycle integration tests.
//!
//! Uses a scripted in-memory `TopicListener` so the reconnect loop can be
//! exercised deterministically; `start_paused` lets the 3 s retry delay
//! elapse without wall-clock waiting.

use async_trait::async_trait;
use fraudfeed_connector::{
    ConnectorConfig, FrameStream, StreamConnector, StreamEvent, TopicListener, WindowAccumulator,
};
use fraudfeed_core::StreamError;
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Session = Vec<Result<String, StreamError>>;

/// Replays pre-scripted sessions. A session stays open (pending) after its
/// items; it only ends through an explicit `Err` entry. Once the scripts
/// run out, further subscribes hang on an empty, open session.
struct ScriptedListener {
    topic: String,
    subscribes: AtomicUsize,
    sessions: Mutex<VecDeque<Session>>,
}

impl ScriptedListener {
    fn new(sessions: Vec<Session>) -> Self {
        Self {
            topic: "/topic/transactions".into(),
            subscribes: AtomicUsize::new(0),
            sessions: Mutex::new(sessions.into()),
        }
    }

    fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TopicListener for ScriptedListener {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn subscribe(&self) -> Result<FrameStream, StreamError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let items = self.sessions.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(stream::iter(items).chain(stream::pending())))
    }
}

fn frame_body(id: u32) -> String {
    serde_json::json!({
        "transactions": [{
            "id": id,
            "time": format!("2024-05-01T12:00:{:02}Z", id % 60),
            "amount": 10.0,
            "merchant": "m",
            "isFraud": false
        }]
    })
    .to_string()
}

fn expect_batch(event: StreamEvent) -> Vec<fraudfeed_core::TransactionScoreEvent> {
    match event {
        StreamEvent::Batch(events) => events,
        other => panic!("expected Batch, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn reconnect_resubscribes_and_keeps_delivering() {
    let listener = Arc::new(ScriptedListener::new(vec![
        vec![Ok(frame_body(1)), Err(StreamError::Closed)],
        vec![Ok(frame_body(2))],
    ]));
    // Capacity 1 makes each send a rendezvous with this receiver, so the
    // run loop is parked mid-session whenever `is_online()` is checked.
    let mut config = ConnectorConfig::new("ws://test");
    config.channel_capacity = 1;
    let (connector, mut rx) = StreamConnector::new(config, listener.clone());
    connector.connect();

    assert_eq!(rx.recv().await.unwrap(), StreamEvent::SessionUp);
    assert!(connector.is_online());
    let batch = expect_batch(rx.recv().await.unwrap());
    assert_eq!(batch[0].id, "1");

    // Session drop: the loop retries on its own, without another connect().
    assert_eq!(rx.recv().await.unwrap(), StreamEvent::SessionDown);
    assert_eq!(rx.recv().await.unwrap(), StreamEvent::SessionUp);
    let batch = expect_batch(rx.recv().await.unwrap());
    assert_eq!(batch[0].id, "2");

    assert_eq!(listener.subscribe_count(), 2);
    connector.disconnect();
    assert!(!connector.is_online());
}

#[tokio::test(start_paused = true)]
async fn connect_is_idempotent() {
    let listener = Arc::new(ScriptedListener::new(vec![vec![Ok(frame_body(1))]]));
    let (connector, mut rx) =
        StreamConnector::new(ConnectorConfig::new("ws://test"), listener.clone());
    connector.connect();
    connector.connect();

    assert_eq!(rx.recv().await.unwrap(), StreamEvent::SessionUp);
    let batch = expect_batch(rx.recv().await.unwrap());
    assert_eq!(batch.len(), 1);

    connector.connect();
    tokio::task::yield_now().await;
    assert_eq!(listener.subscribe_count(), 1);
}

#[tokio::test]
async fn disconnect_is_safe_anytime() {
    let listener = Arc::new(ScriptedListener::new(vec![]));
    let (connector, _rx) = StreamConnector::new(ConnectorConfig::new("ws://test"), listener);

    connector.disconnect(); // before any connect
    connector.connect();
    connector.disconnect();
    connector.disconnect(); // twice in a row
    assert!(!connector.is_online());
}

#[tokio::test(start_paused = true)]
async fn undecodable_frame_dropped_stream_stays_up() {
    let listener = Arc::new(ScriptedListener::new(vec![vec![
        Ok("not json".into()),
        Ok(r#"{"noTransactions": true}"#.into()),
        Ok(frame_body(3)),
    ]]));
    let (connector, mut rx) = StreamConnector::new(ConnectorConfig::new("ws://test"), listener);
    connector.connect();

    assert_eq!(rx.recv().await.unwrap(), StreamEvent::SessionUp);
    // The two bad frames produce nothing; the next event is id 3's batch.
    let batch = expect_batch(rx.recv().await.unwrap());
    assert_eq!(batch[0].id, "3");
    assert!(connector.is_online());
}

#[tokio::test(start_paused = true)]
async fn accumulator_resets_on_reconnect() {
    let listener = Arc::new(ScriptedListener::new(vec![
        vec![Ok(frame_body(1)), Err(StreamError::Closed)],
        vec![Ok(frame_body(2))],
    ]));
    let (connector, rx) = StreamConnector::new(ConnectorConfig::new("ws://test"), listener);
    let (accumulator, mut snapshots) = WindowAccumulator::new(100);
    tokio::spawn(accumulator.run(rx));
    connector.connect();

    loop {
        snapshots.changed().await.unwrap();
        let snap = snapshots.borrow().clone();
        if snap.iter().any(|e| e.id == "2") {
            // Reconnect cleared pre-disconnect state; id 1 must be gone.
            assert!(!snap.iter().any(|e| e.id == "1"));
            break;
        }
    }
    connector.disconnect();
}
