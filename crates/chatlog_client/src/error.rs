//! Error types for the chatlog client.

use chatlog_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the message service or driving
/// the client state machines.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected locally before any request was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The service rejected the shared secret.
    #[error("invalid credential")]
    Unauthorized,

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The service failed with a 5xx status.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The service rejected the request with a 4xx status other than 401.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Malformed request or response body.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid state transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted transition.
        to: String,
    },

    /// No async runtime is available to drive the polling loop.
    #[error("no async runtime available")]
    NoRuntime,
}

impl ClientError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { retryable, .. } => *retryable,
            ClientError::Server { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the shared secret was rejected.
    ///
    /// Kept distinct from every other failure so callers can prompt for a
    /// new credential instead of reporting a generic error.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Returns true if the input was rejected locally.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::EmptyContent | ProtocolError::InvalidId(_) => {
                ClientError::Validation(err.to_string())
            }
            other => ClientError::Protocol(other.to_string()),
        }
    }
}
