//! HTTP transport implementation.
//!
//! This module provides an HTTP-based transport for the message service.
//! The actual HTTP client is abstracted via a trait so the transport can run
//! over reqwest in production and over an in-process loopback in tests.

use crate::error::{ClientError, ClientResult};
use crate::secret::Secret;
use crate::transport::MessageTransport;
use chatlog_protocol::{
    message_path, ClearMessagesRequest, CreateMessageRequest, HttpRequest, HttpResponse, Message,
    MessageCollection, MessageId, Method, MESSAGES_PATH,
};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
pub trait HttpClient: Send + Sync + 'static {
    /// Sends `request` to `base_url` + `request.path`.
    ///
    /// Errors are reserved for requests that never produced a response;
    /// non-2xx statuses are returned as responses.
    fn send(
        &self,
        base_url: &str,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, String>> + Send;
}

/// HTTP-based message transport.
///
/// Uses JSON request/response bodies and maps status codes onto
/// [`ClientError`]: 401 is an authorization failure, 5xx a retryable server
/// error, any other non-2xx a rejection.
pub struct HttpTransport<C: HttpClient> {
    /// Base URL of the service (e.g., "https://chat.example.com").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Last transport error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    async fn call(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        debug!(method = %request.method, path = %request.path, "sending request");
        match self.client.send(&self.base_url, request).await {
            Ok(response) => {
                *self.last_error.write() = None;
                Ok(response)
            }
            Err(e) => {
                *self.last_error.write() = Some(e.clone());
                Err(ClientError::transport_retryable(e))
            }
        }
    }
}

/// Maps a non-2xx response onto a client error.
fn status_error(response: &HttpResponse) -> ClientError {
    match response.status {
        401 => ClientError::Unauthorized,
        status @ 500..=599 => ClientError::Server {
            status,
            message: response.error_message(),
        },
        status => ClientError::Rejected {
            status,
            message: response.error_message(),
        },
    }
}

impl<C: HttpClient> MessageTransport for HttpTransport<C> {
    async fn fetch_messages(&self) -> ClientResult<MessageCollection> {
        let response = self.call(HttpRequest::get(MESSAGES_PATH)).await?;
        if !response.is_success() {
            return Err(status_error(&response));
        }
        Ok(response.decode()?)
    }

    async fn create_message(&self, request: &CreateMessageRequest) -> ClientResult<Message> {
        let request = HttpRequest::with_json(Method::Post, MESSAGES_PATH, request)?;
        let response = self.call(request).await?;
        if !response.is_success() {
            return Err(status_error(&response));
        }
        Ok(response.decode()?)
    }

    async fn delete_message(&self, id: &MessageId) -> ClientResult<()> {
        let response = self.call(HttpRequest::delete(message_path(id)?)).await?;
        match response.status {
            404 => {
                debug!(%id, "message already gone");
                Ok(())
            }
            _ if response.is_success() => Ok(()),
            _ => Err(status_error(&response)),
        }
    }

    async fn clear_messages(&self, secret: &Secret) -> ClientResult<()> {
        let body = ClearMessagesRequest::new(secret.expose());
        let request = HttpRequest::with_json(Method::Delete, MESSAGES_PATH, &body)?;
        let response = self.call(request).await?;
        if !response.is_success() {
            return Err(status_error(&response));
        }
        Ok(())
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a request and returns the response.
    fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

impl<S: LoopbackServer> LoopbackServer for Arc<S> {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        (**self).handle(request)
    }
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync + 'static> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

impl<S: LoopbackServer + Send + Sync + 'static> HttpClient for LoopbackClient<S> {
    async fn send(&self, _base_url: &str, request: HttpRequest) -> Result<HttpResponse, String> {
        Ok(self.server.handle(&request))
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;

#[cfg(feature = "reqwest")]
mod reqwest_client {
    use super::HttpClient;
    use crate::config::ClientConfig;
    use crate::error::{ClientError, ClientResult};
    use chatlog_protocol::{HttpRequest, HttpResponse, Method};

    /// [`HttpClient`] backed by reqwest.
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Builds a client honoring the configured request timeout.
        pub fn new(config: &ClientConfig) -> ClientResult<Self> {
            let client = reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .map_err(|e| ClientError::transport_fatal(e.to_string()))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        async fn send(&self, base_url: &str, request: HttpRequest) -> Result<HttpResponse, String> {
            let url = format!("{}{}", base_url, request.path);
            let mut builder = match request.method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
                Method::Delete => self.client.delete(&url),
            };
            if let Some(body) = &request.body {
                // reqwest takes ownership of its copy; ours is wiped on drop.
                builder = builder
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body.to_vec());
            }

            let response = builder.send().await.map_err(|e| e.to_string())?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| e.to_string())?;
            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    /// Replies with a scripted response and records what it was sent.
    struct TestClient {
        response: Mutex<Option<HttpResponse>>,
        sent: Mutex<Vec<(String, HttpRequest)>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: Mutex::new(None),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn replying(response: HttpResponse) -> Self {
            let client = Self::new();
            *client.response.lock() = Some(response);
            client
        }
    }

    impl HttpClient for TestClient {
        async fn send(&self, base_url: &str, request: HttpRequest) -> Result<HttpResponse, String> {
            self.sent.lock().push((base_url.to_string(), request));
            self.response
                .lock()
                .clone()
                .ok_or_else(|| "connection refused".to_string())
        }
    }

    fn sample() -> Message {
        Message::new("1", "hi", Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn transport_creation() {
        let transport = HttpTransport::new("https://chat.example.com/", TestClient::new());
        assert_eq!(transport.base_url(), "https://chat.example.com");
        assert!(transport.last_error().is_none());
    }

    #[tokio::test]
    async fn fetch_decodes_snapshot() {
        let body = vec![sample()];
        let client = TestClient::replying(HttpResponse::json(200, &body).unwrap());
        let transport = HttpTransport::new("https://chat.example.com", client);

        let collection = transport.fetch_messages().await.unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.as_slice()[0], sample());

        let sent = transport.client.sent.lock();
        assert_eq!(sent[0].0, "https://chat.example.com");
        assert_eq!(sent[0].1.method, Method::Get);
        assert_eq!(sent[0].1.path, MESSAGES_PATH);
    }

    #[tokio::test]
    async fn fetch_failure_is_retryable_and_recorded() {
        let transport = HttpTransport::new("https://chat.example.com", TestClient::new());
        let err = transport.fetch_messages().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.last_error().as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn create_posts_content() {
        let client = TestClient::replying(HttpResponse::json(201, &sample()).unwrap());
        let transport = HttpTransport::new("https://chat.example.com", client);

        let request = CreateMessageRequest::new("hi").unwrap();
        let created = transport.create_message(&request).await.unwrap();
        assert_eq!(created.id.as_str(), "1");

        let sent = transport.client.sent.lock();
        assert_eq!(sent[0].1.method, Method::Post);
        let body: CreateMessageRequest = sent[0].1.json().unwrap();
        assert_eq!(body.content, "hi");
    }

    #[tokio::test]
    async fn delete_missing_message_succeeds() {
        let client = TestClient::replying(HttpResponse::error(404, "not found"));
        let transport = HttpTransport::new("https://chat.example.com", client);

        transport.delete_message(&MessageId::new("1")).await.unwrap();
        assert_eq!(transport.client.sent.lock()[0].1.path, "/api/messages/1");
    }

    #[tokio::test]
    async fn clear_maps_unauthorized() {
        let client = TestClient::replying(HttpResponse::error(401, "invalid password"));
        let transport = HttpTransport::new("https://chat.example.com", client);

        let err = transport
            .clear_messages(&Secret::new("wrong"))
            .await
            .unwrap_err();
        assert!(err.is_authorization_failure());

        let sent = transport.client.sent.lock();
        assert_eq!(sent[0].1.method, Method::Delete);
        assert_eq!(sent[0].1.path, MESSAGES_PATH);
        let body: ClearMessagesRequest<'_> = sent[0].1.json().unwrap();
        assert_eq!(body.password, "wrong");
    }

    #[tokio::test]
    async fn server_errors_are_generic() {
        let client = TestClient::replying(HttpResponse::error(500, "database down"));
        let transport = HttpTransport::new("https://chat.example.com", client);

        let err = transport
            .clear_messages(&Secret::new("s3cret"))
            .await
            .unwrap_err();
        assert!(!err.is_authorization_failure());
        assert!(matches!(err, ClientError::Server { status: 500, .. }));
    }

    #[tokio::test]
    async fn rejected_create_keeps_status() {
        let client = TestClient::replying(HttpResponse::error(400, "content required"));
        let transport = HttpTransport::new("https://chat.example.com", client);

        let request = CreateMessageRequest::new("x").unwrap();
        let err = transport.create_message(&request).await.unwrap_err();
        match err {
            ClientError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "content required");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
