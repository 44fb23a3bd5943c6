//! Error types for the wire protocol.

use crate::message::MessageId;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while building or decoding protocol values.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A snapshot contained the same id more than once.
    #[error("duplicate message id in snapshot: {0}")]
    DuplicateId(MessageId),

    /// A message id cannot be used as a single path segment.
    #[error("invalid message id: {0:?}")]
    InvalidId(String),

    /// Message content was empty or whitespace only.
    #[error("message content is empty")]
    EmptyContent,

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
