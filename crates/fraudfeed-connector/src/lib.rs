//! # fraudfeed-connector
//!
//! Realtime stream connector for FraudFeed.
//!
//! Maintains a long-lived subscription to one broker topic of freshly
//! scored transactions, decodes inbound frames into domain events, and
//! feeds a bounded window whose snapshots are published to observers.
//!
//! ## Architecture
//! ```text
//! TopicListener (STOMP over WebSocket, Tokio task)
//!       │  raw frame bodies
//!       ▼
//! StreamConnector (fixed-delay reconnect loop)
//!       │  mpsc::Receiver<StreamEvent>
//!       ▼
//! WindowAccumulator (single writer over the Window)
//!       │
//!       ▼
//! watch::Receiver<Snapshot>   ← observers (charts, alert logic)
//! ```

pub mod accumulator;
pub mod config;
pub mod connector;
pub mod listener;
pub mod stomp;
pub mod ws_listener;

pub use accumulator::{Snapshot, WindowAccumulator};
pub use config::ConnectorConfig;
pub use connector::{StreamConnector, StreamEvent};
pub use listener::{FrameStream, TopicListener};
pub use ws_listener::StompWsListener;
