//! Transport layer abstraction for the message service.

use crate::error::{ClientError, ClientResult};
use crate::secret::Secret;
use chatlog_protocol::{CreateMessageRequest, Message, MessageCollection, MessageId};
use chrono::Utc;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A message transport handles communication with the message service.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-process loopback, mock for testing, etc.).
pub trait MessageTransport: Send + Sync + 'static {
    /// Fetches the full message collection.
    fn fetch_messages(&self) -> impl Future<Output = ClientResult<MessageCollection>> + Send;

    /// Creates one message.
    fn create_message(
        &self,
        request: &CreateMessageRequest,
    ) -> impl Future<Output = ClientResult<Message>> + Send;

    /// Deletes one message. Deleting a missing id succeeds.
    fn delete_message(&self, id: &MessageId) -> impl Future<Output = ClientResult<()>> + Send;

    /// Clears the whole collection. A rejected secret yields
    /// [`ClientError::Unauthorized`].
    fn clear_messages(&self, secret: &Secret) -> impl Future<Output = ClientResult<()>> + Send;
}

#[derive(Default)]
struct MockState {
    messages: Vec<Message>,
    next_id: u64,
    secret: String,
    failing_fetches: u32,
    unavailable: bool,
    latency: Duration,
}

/// A mock transport for testing.
///
/// Keeps an in-memory log with service semantics and counts every call.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    clear_calls: AtomicUsize,
}

impl MockTransport {
    /// Creates a mock whose clear-all accepts `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        let transport = Self::default();
        transport.state.lock().secret = secret.into();
        transport
    }

    /// Appends a message as if another client had posted it.
    pub fn seed(&self, content: impl Into<String>) -> MessageId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = MessageId::new(state.next_id.to_string());
        state
            .messages
            .push(Message::new(id.clone(), content, Utc::now()));
        id
    }

    /// Makes the next `count` fetches fail with a retryable transport error.
    pub fn fail_next_fetches(&self, count: u32) {
        self.state.lock().failing_fetches = count;
    }

    /// Makes every call fail with a retryable transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Delays every call by `latency` before it touches the log.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Returns the server-side messages.
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    /// Number of fetch calls made.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of create calls made.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of delete-one calls made.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of clear-all calls made.
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    async fn respond_after_latency(&self) -> ClientResult<()> {
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.check_available()
    }

    fn check_available(&self) -> ClientResult<()> {
        if self.state.lock().unavailable {
            Err(ClientError::transport_retryable("mock service unavailable"))
        } else {
            Ok(())
        }
    }
}

impl MessageTransport for MockTransport {
    async fn fetch_messages(&self) -> ClientResult<MessageCollection> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.respond_after_latency().await?;
        let mut state = self.state.lock();
        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(ClientError::transport_retryable("mock fetch failure"));
        }
        Ok(MessageCollection::from_messages(state.messages.clone())?)
    }

    async fn create_message(&self, request: &CreateMessageRequest) -> ClientResult<Message> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.respond_after_latency().await?;
        let id = self.seed(request.content.clone());
        let state = self.state.lock();
        state
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ClientError::Protocol("created message missing".into()))
    }

    async fn delete_message(&self, id: &MessageId) -> ClientResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.respond_after_latency().await?;
        self.state.lock().messages.retain(|m| &m.id != id);
        Ok(())
    }

    async fn clear_messages(&self, secret: &Secret) -> ClientResult<()> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.respond_after_latency().await?;
        let mut state = self.state.lock();
        if state.secret != secret.expose() {
            return Err(ClientError::Unauthorized);
        }
        state.messages.clear();
        Ok(())
    }
}
