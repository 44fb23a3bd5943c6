//! Main message server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::RequestHandler;
use crate::log::MessageLog;
use chatlog_protocol::{HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::warn;

/// The message server.
///
/// Wraps a [`RequestHandler`] and turns handler errors into JSON error
/// responses with the matching status code.
///
/// # Example
///
/// ```
/// use chatlog_protocol::{HttpRequest, MESSAGES_PATH};
/// use chatlog_server::{MessageServer, ServerConfig};
///
/// let server = MessageServer::new(ServerConfig::default()).unwrap();
/// let response = server.handle(&HttpRequest::get(MESSAGES_PATH));
/// assert_eq!(response.status, 200);
/// ```
pub struct MessageServer {
    handler: RequestHandler,
    log: Arc<MessageLog>,
}

impl MessageServer {
    /// Creates a new server with an empty log.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Self::with_log(config, Arc::new(MessageLog::new()))
    }

    /// Creates a server over an existing log.
    pub fn with_log(config: ServerConfig, log: Arc<MessageLog>) -> ServerResult<Self> {
        let handler = RequestHandler::new(config, Arc::clone(&log))?;
        Ok(Self { handler, log })
    }

    /// Handles a request, mapping errors onto responses.
    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        match self.handler.handle(request) {
            Ok(response) => response,
            Err(e) => {
                if e.is_server_error() {
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        error = %e,
                        "request failed"
                    );
                }
                HttpResponse::error(e.status_code(), e.to_string())
            }
        }
    }

    /// Returns the message log.
    pub fn log(&self) -> &Arc<MessageLog> {
        &self.log
    }

    /// Returns the number of stored messages.
    pub fn message_count(&self) -> usize {
        self.log.len()
    }
}
