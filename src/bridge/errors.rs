//! Error types for persistence and host messaging
//!
//! None of these reach the user as editing failures. The bridge turns them
//! into a transient notice (persistence) or a silent drop (messaging).

use thiserror::Error;

/// Local fallback store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No storage is available in this context
    #[error("Local storage unavailable")]
    Unavailable,

    /// The write was refused (quota, privacy mode)
    #[error("Local storage write failed for {key}: {message}")]
    WriteFailed { key: String, message: String },

    #[error("Local storage read failed for {key}: {message}")]
    ReadFailed { key: String, message: String },
}

/// Message and persistence bridge failures
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// Inbound data is not a message envelope
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Envelope type is not part of the protocol
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// Envelope requires a payload but has none
    #[error("Message {0} is missing its payload")]
    MissingPayload(String),

    /// Outbound message could not be encoded or posted
    #[error("Failed to post message: {0}")]
    PostFailed(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Persistence API failure on the host side
    #[error("Score API error: {0}")]
    Api(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Malformed(err.to_string())
    }
}
