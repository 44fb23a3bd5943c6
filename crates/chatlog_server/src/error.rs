//! Error types for the message server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the message server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authorization failed.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// No such route or message.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::NotAuthorized(_) => 401,
            ServerError::NotFound(_) => 404,
            ServerError::Internal(_) => 500,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::NotAuthorized(_)
                | ServerError::NotFound(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::Internal(_))
    }
}

impl From<chatlog_protocol::ProtocolError> for ServerError {
    fn from(err: chatlog_protocol::ProtocolError) -> Self {
        ServerError::InvalidRequest(err.to_string())
    }
}
