//! Connector configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one broker subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Broker WebSocket endpoint, e.g. "wss://scoring.example.com/stream"
    pub endpoint: String,
    /// Destination topic carrying scored transactions
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Fixed delay between reconnect attempts, in milliseconds.
    /// No backoff and no retry cap.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Event channel capacity between connector and accumulator
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Maximum number of events retained by the window
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
}

fn default_topic() -> String {
    "/topic/transactions".into()
}
fn default_retry_delay_ms() -> u64 {
    3_000
}
fn default_channel_capacity() -> usize {
    1_024
}
fn default_window_capacity() -> usize {
    fraudfeed_core::DEFAULT_WINDOW_CAPACITY
}

impl ConnectorConfig {
    /// Create a config for `endpoint` with all defaults.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            topic: default_topic(),
            retry_delay_ms: default_retry_delay_ms(),
            channel_capacity: default_channel_capacity(),
            window_capacity: default_window_capacity(),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
