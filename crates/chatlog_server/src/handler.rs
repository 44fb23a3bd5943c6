//! Request handlers for the message endpoints.

use crate::auth::ClearAuthorizer;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::log::MessageLog;
use chatlog_protocol::{
    validate_content, ClearMessagesRequest, CreateMessageRequest, HttpRequest, HttpResponse,
    MessageId, Method, MESSAGES_PATH,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Body returned by a successful clear-all.
#[derive(Debug, Serialize)]
struct ClearedBody {
    deleted: usize,
}

/// A resolved route.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Collection,
    Message(MessageId),
}

fn route(path: &str) -> Option<Route> {
    let path = path.split('?').next().unwrap_or(path);
    let rest = path.strip_prefix(MESSAGES_PATH)?;
    match rest.trim_end_matches('/') {
        "" => Some(Route::Collection),
        tail => {
            let id = MessageId::new(tail.strip_prefix('/')?);
            id.validate().ok()?;
            Some(Route::Message(id))
        }
    }
}

/// Handler for message requests.
pub struct RequestHandler {
    config: ServerConfig,
    log: Arc<MessageLog>,
    authorizer: ClearAuthorizer,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(config: ServerConfig, log: Arc<MessageLog>) -> ServerResult<Self> {
        let authorizer = ClearAuthorizer::new(config.clear_secret.as_deref().map(Vec::as_slice))?;
        if !authorizer.is_enabled() {
            warn!("no clear secret configured, clear-all is disabled");
        }
        Ok(Self {
            config,
            log,
            authorizer,
        })
    }

    /// Dispatches a request to the matching endpoint.
    pub fn handle(&self, request: &HttpRequest) -> ServerResult<HttpResponse> {
        match (request.method, route(&request.path)) {
            (Method::Get, Some(Route::Collection)) => self.handle_list(),
            (Method::Post, Some(Route::Collection)) => self.handle_create(request),
            (Method::Delete, Some(Route::Collection)) => self.handle_clear(request),
            (Method::Delete, Some(Route::Message(id))) => self.handle_delete(&id),
            (method, _) => Err(ServerError::NotFound(format!(
                "no route for {} {}",
                method, request.path
            ))),
        }
    }

    /// Lists every message in creation order.
    pub fn handle_list(&self) -> ServerResult<HttpResponse> {
        Ok(HttpResponse::json(200, &self.log.snapshot())?)
    }

    /// Creates a message.
    pub fn handle_create(&self, request: &HttpRequest) -> ServerResult<HttpResponse> {
        let body: CreateMessageRequest = request.json()?;
        validate_content(&body.content)?;
        if body.content.len() > self.config.max_content_len {
            return Err(ServerError::InvalidRequest(format!(
                "message too long: {} > {}",
                body.content.len(),
                self.config.max_content_len
            )));
        }

        let message = self.log.append(body.content, Utc::now());
        debug!(id = %message.id, "message created");
        Ok(HttpResponse::json(201, &message)?)
    }

    /// Deletes one message.
    pub fn handle_delete(&self, id: &MessageId) -> ServerResult<HttpResponse> {
        if !self.log.remove(id) {
            return Err(ServerError::NotFound(format!("message {}", id)));
        }
        debug!(%id, "message deleted");
        Ok(HttpResponse::empty(204))
    }

    /// Clears the whole log if the password is correct.
    pub fn handle_clear(&self, request: &HttpRequest) -> ServerResult<HttpResponse> {
        if !self.authorizer.is_enabled() {
            return Err(ServerError::NotAuthorized("clear-all is disabled".into()));
        }
        let body: ClearMessagesRequest<'_> = request.json()?;
        self.authorizer.verify(&body.password)?;

        let deleted = self.log.clear();
        info!(deleted, "message log cleared");
        Ok(HttpResponse::json(200, &ClearedBody { deleted })?)
    }
}
