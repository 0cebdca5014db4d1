//! `TopicListener` trait — abstraction over the broker transport.
//!
//! Any concrete client (STOMP over WebSocket, raw socket, polling
//! fallback) can satisfy it; the connector only needs a subscribable
//! stream of raw frame bodies.

use async_trait::async_trait;
use fraudfeed_core::StreamError;
use futures::Stream;
use std::pin::Pin;

/// A stream of raw frame bodies from one topic subscription.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// Abstracts over broker transports.
#[async_trait]
pub trait TopicListener: Send + Sync {
    /// Destination topic this listener subscribes to.
    fn topic(&self) -> &str;

    /// Establish a session and subscribe. Returns a pinned async stream
    /// of frame bodies; stream end or error means the session is gone
    /// and the caller should re-subscribe.
    async fn subscribe(&self) -> Result<FrameStream, StreamError>;

    /// Returns `true` while a session is established.
    fn is_connected(&self) -> bool;
}
