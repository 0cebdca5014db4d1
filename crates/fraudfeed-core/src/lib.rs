//! # fraudfeed-core
//!
//! Core types and primitives shared across all FraudFeed crates.
//! The stream connector, accumulator, and playback controller are all
//! built on top of the types defined here.

pub mod error;
pub mod event;
pub mod frame;
pub mod window;

pub use error::{DecodeError, StreamError};
pub use event::{Prediction, Severity, TransactionScoreEvent};
pub use frame::decode_frame;
pub use window::{Window, DEFAULT_WINDOW_CAPACITY};
