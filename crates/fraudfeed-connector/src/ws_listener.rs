//! `StompWsListener` — concrete `TopicListener` over STOMP 1.2 on a
//! WebSocket transport.
//!
//! The listener performs the CONNECT/CONNECTED handshake and issues one
//! SUBSCRIBE per session; reconnection is handled by the `StreamConnector`,
//! which calls `subscribe()` again after the stream ends.

use crate::listener::{FrameStream, TopicListener};
use crate::stomp::StompFrame;
use async_trait::async_trait;
use fraudfeed_core::StreamError;
use futures::channel::{mpsc, oneshot};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

const SUBSCRIPTION_ID: &str = "sub-0";
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const FRAME_CHANNEL_CAPACITY: usize = 512;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// STOMP-over-WebSocket topic listener.
pub struct StompWsListener {
    endpoint: String,
    topic: String,
    connected: Arc<AtomicBool>,
}

impl StompWsListener {
    /// Create a listener for `topic` on the broker at `endpoint`
    /// (`ws://` or `wss://`).
    pub fn new(endpoint: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            topic: topic.into(),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    fn host(&self) -> String {
        url::Url::parse(&self.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.endpoint.clone())
    }
}

#[async_trait]
impl TopicListener for StompWsListener {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn subscribe(&self) -> Result<FrameStream, StreamError> {
        info!(endpoint = %self.endpoint, topic = %self.topic, "connecting to broker");

        let mut ws = match connect_async(&self.endpoint).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                return Err(StreamError::ConnectionFailed {
                    url: self.endpoint.clone(),
                    reason: e.to_string(),
                })
            }
        };
        tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(&mut ws, &self.host(), &self.topic))
            .await
            .map_err(|_| StreamError::Handshake("timed out waiting for CONNECTED".into()))??;

        self.connected.store(true, Ordering::Relaxed);
        info!(topic = %self.topic, "subscribed");

        let (tx, rx) = mpsc::channel::<Result<String, StreamError>>(FRAME_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let connected = Arc::clone(&self.connected);
        tokio::spawn(async move {
            pump_session(ws, tx, shutdown_rx).await;
            connected.store(false, Ordering::Relaxed);
        });

        Ok(Box::pin(SessionStream { frames: rx, _shutdown: shutdown_tx }))
    }
}

/// Frame stream handed to the connector. Dropping it releases the shutdown
/// guard, which wakes the pump task so the session is torn down promptly
/// even when the topic is idle.
struct SessionStream {
    frames: mpsc::Receiver<Result<String, StreamError>>,
    _shutdown: oneshot::Sender<()>,
}

impl Stream for SessionStream {
    type Item = Result<String, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.frames).poll_next(cx)
    }
}

/// CONNECT/CONNECTED handshake followed by SUBSCRIBE.
async fn handshake(ws: &mut WsStream, host: &str, topic: &str) -> Result<(), StreamError> {
    ws.send(Message::Text(StompFrame::connect(host).encode()))
        .await
        .map_err(|e| StreamError::Handshake(e.to_string()))?;

    loop {
        let msg = ws
            .next()
            .await
            .ok_or_else(|| StreamError::Handshake("socket closed before CONNECTED".into()))?
            .map_err(|e| StreamError::Handshake(e.to_string()))?;

        let text = match msg {
            Message::Text(text) if text.trim().is_empty() => continue, // heart-beat
            Message::Text(text) => text,
            Message::Ping(data) => {
                let _ = ws.send(Message::Pong(data)).await;
                continue;
            }
            Message::Close(_) => {
                return Err(StreamError::Handshake("socket closed before CONNECTED".into()))
            }
            _ => continue,
        };

        let frame = StompFrame::parse(&text)?;
        match frame.command.as_str() {
            "CONNECTED" => break,
            "ERROR" => {
                let reason = frame
                    .header("message")
                    .map(str::to_string)
                    .unwrap_or(frame.body);
                return Err(StreamError::Handshake(reason));
            }
            other => debug!(command = other, "ignoring frame during handshake"),
        }
    }

    ws.send(Message::Text(
        StompFrame::subscribe(SUBSCRIPTION_ID, topic).encode(),
    ))
    .await
    .map_err(|e| StreamError::Handshake(e.to_string()))
}

/// Forwards MESSAGE bodies until the socket drops, the broker errors, or
/// the host releases the stream (dropping the shutdown guard).
async fn pump_session<S, E>(
    ws: S,
    mut tx: mpsc::Sender<Result<String, StreamError>>,
    mut shutdown: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Message, E>> + Sink<Message> + Unpin,
    E: std::fmt::Display,
{
    let (mut write, mut read) = ws.split();

    loop {
        let msg_result = tokio::select! {
            _ = &mut shutdown => {
                teardown(&mut write).await;
                return;
            }
            msg = read.next() => match msg {
                Some(m) => m,
                None => break,
            },
        };
        match msg_result {
            Err(e) => {
                warn!("WebSocket error: {e}");
                let _ = tx.send(Err(StreamError::Closed)).await;
                return;
            }
            Ok(Message::Text(text)) => {
                if text.trim_matches(['\n', '\r', '\0']).is_empty() {
                    continue; // broker heart-beat
                }
                let frame = match StompFrame::parse(&text) {
                    Ok(f) => f,
                    Err(e) => {
                        debug!("unparseable broker frame dropped: {e}");
                        continue;
                    }
                };
                match frame.command.as_str() {
                    "MESSAGE" => {
                        if tx.send(Ok(frame.body)).await.is_err() {
                            // Receiver dropped — session torn down by the host.
                            teardown(&mut write).await;
                            return;
                        }
                    }
                    "ERROR" => {
                        let reason = frame
                            .header("message")
                            .map(str::to_string)
                            .unwrap_or(frame.body);
                        warn!("broker ERROR frame: {reason}");
                        let _ = tx.send(Err(StreamError::Protocol(reason))).await;
                        return;
                    }
                    "RECEIPT" => {}
                    other => debug!(command = other, "ignoring broker frame"),
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed by broker");
                let _ = tx.send(Err(StreamError::Closed)).await;
                return;
            }
            Ok(_) => {} // binary / pong — ignore
        }
    }

    let _ = tx.send(Err(StreamError::Closed)).await;
}

/// Best-effort UNSUBSCRIBE + DISCONNECT, then close the sink; failures
/// here are ignored.
async fn teardown<S>(write: &mut S)
where
    S: Sink<Message> + Unpin,
{
    let _ = write
        .send(Message::Text(
            StompFrame::unsubscribe(SUBSCRIPTION_ID).encode(),
        ))
        .await;
    let _ = write
        .send(Message::Text(StompFrame::disconnect().encode()))
        .await;
    let _ = write.close().await;
}
