//! Server-side ordered message log.

use chatlog_protocol::{Message, MessageCollection, MessageId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// The authoritative, insertion-ordered message log.
pub struct MessageLog {
    messages: RwLock<Vec<Message>>,
}

impl MessageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
        }
    }

    /// Returns a snapshot in creation order.
    pub fn snapshot(&self) -> MessageCollection {
        // Ids are server-generated uuids, so the snapshot is always valid.
        MessageCollection::from_messages(self.messages.read().clone()).unwrap_or_default()
    }

    /// Appends a message with a fresh id.
    pub fn append(&self, content: impl Into<String>, timestamp: DateTime<Utc>) -> Message {
        let id = MessageId::new(uuid::Uuid::new_v4().simple().to_string());
        let message = Message::new(id, content, timestamp);
        self.messages.write().push(message.clone());
        message
    }

    /// Removes one message. Returns false if it did not exist.
    pub fn remove(&self, id: &MessageId) -> bool {
        let mut messages = self.messages.write();
        let before = messages.len();
        messages.retain(|m| &m.id != id);
        messages.len() != before
    }

    /// Removes every message, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut messages = self.messages.write();
        let count = messages.len();
        messages.clear();
        count
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
