//! Error types for the FraudFeed stream pipeline.

use thiserror::Error;

/// Errors that can occur while decoding a single frame or record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Frame body is not a JSON object")]
    NotAnObject,

    #[error("Frame has no `transactions` array")]
    MissingTransactions,

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl DecodeError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField { field: field.into() }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field: field.into(), reason: reason.into() }
    }
}

/// Errors from the streaming connector.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Broker connection failed: {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Stream closed unexpectedly")]
    Closed,

    #[error("Broker handshake failed: {0}")]
    Handshake(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Decode error in stream: {0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Other(String),
}
