//! Messages and full-collection snapshots.

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque, server-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wraps a server-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Checks that the id can be sent as one URL path segment.
    ///
    /// Ids are opaque, but an empty id or one containing `/`, `?`, `#`,
    /// `%`, whitespace or control characters would address a different
    /// route than the message it names.
    pub fn validate(&self) -> ProtocolResult<&str> {
        let reserved =
            |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control();
        if self.0.is_empty() || self.0.contains(reserved) {
            Err(ProtocolError::InvalidId(self.0.clone()))
        } else {
            Ok(&self.0)
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single message in the shared log.
///
/// Messages are immutable once created by the server. Clients add or remove
/// whole messages from their view, never edit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identity.
    #[serde(rename = "_id", alias = "id")]
    pub id: MessageId,
    /// Text content.
    pub content: String,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message.
    pub fn new(
        id: impl Into<MessageId>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            timestamp,
        }
    }
}

/// A full snapshot of the server's message log in server order.
///
/// Ids are unique within a snapshot. Construction and decoding both reject
/// duplicates, so every value of this type upholds the invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct MessageCollection {
    messages: Vec<Message>,
}

impl MessageCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot, rejecting duplicate ids.
    pub fn from_messages(messages: Vec<Message>) -> ProtocolResult<Self> {
        let mut seen = HashSet::with_capacity(messages.len());
        for message in &messages {
            if !seen.insert(&message.id) {
                return Err(ProtocolError::DuplicateId(message.id.clone()));
            }
        }
        Ok(Self { messages })
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the snapshot holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterates messages in server order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Returns the messages in server order.
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// Looks up a message by id.
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Returns true if a message with this id is present.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the ids in server order.
    pub fn ids(&self) -> Vec<&MessageId> {
        self.messages.iter().map(|m| &m.id).collect()
    }

    /// Returns the messages ordered by timestamp, ties kept in server order.
    pub fn by_timestamp(&self) -> Vec<&Message> {
        let mut ordered: Vec<&Message> = self.messages.iter().collect();
        ordered.sort_by_key(|m| m.timestamp);
        ordered
    }

}

impl TryFrom<Vec<Message>> for MessageCollection {
    type Error = ProtocolError;

    fn try_from(messages: Vec<Message>) -> ProtocolResult<Self> {
        Self::from_messages(messages)
    }
}

impl From<MessageCollection> for Vec<Message> {
    fn from(collection: MessageCollection) -> Self {
        collection.messages
    }
}

impl<'a> IntoIterator for &'a MessageCollection {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn decode_document_store_ids() {
        let json = r#"[
            {"_id": "1", "content": "hi", "timestamp": "2024-05-01T10:00:00.000Z"},
            {"_id": "2", "content": "yo", "timestamp": "2024-05-01T10:00:05Z"}
        ]"#;
        let collection: MessageCollection = serde_json::from_str(json).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.ids(), vec![&MessageId::new("1"), &MessageId::new("2")]);
        assert_eq!(collection.as_slice()[1].content, "yo");
    }

    #[test]
    fn decode_accepts_plain_id() {
        let json = r#"{"id": "7", "content": "x", "timestamp": "2024-05-01T10:00:00Z"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.id.as_str(), "7");
    }

    #[test]
    fn encode_uses_document_store_id() {
        let message = Message::new("9", "hey", at(0));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["_id"], "9");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let json = r#"[
            {"_id": "1", "content": "a", "timestamp": "2024-05-01T10:00:00Z"},
            {"_id": "1", "content": "b", "timestamp": "2024-05-01T10:00:01Z"}
        ]"#;
        let result: Result<MessageCollection, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn timestamp_order_is_stable() {
        let collection = MessageCollection::from_messages(vec![
            Message::new("a", "late", at(20)),
            Message::new("b", "early", at(10)),
            Message::new("c", "tie", at(20)),
        ])
        .unwrap();

        let ordered: Vec<&str> = collection
            .by_timestamp()
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ordered, vec!["b", "a", "c"]);
        // Server order is untouched.
        assert_eq!(collection.as_slice()[0].id.as_str(), "a");
    }

    #[test]
    fn ids_must_be_single_path_segments() {
        assert_eq!(MessageId::new("6650f1c2a9").validate().unwrap(), "6650f1c2a9");
        for bad in ["", "a/b", "a?nope", "a#frag", "a%2F", "a b", "a\n"] {
            assert!(
                matches!(MessageId::new(bad).validate(), Err(ProtocolError::InvalidId(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn lookup_by_id() {
        let collection =
            MessageCollection::from_messages(vec![Message::new("x", "one", at(1))]).unwrap();
        assert!(collection.contains(&MessageId::new("x")));
        assert!(!collection.contains(&MessageId::new("y")));
        assert_eq!(collection.get(&MessageId::new("x")).unwrap().content, "one");
    }

    proptest! {
        #[test]
        fn accepts_exactly_unique_ids(ids in proptest::collection::vec(0u8..16, 0..12)) {
            let messages: Vec<Message> = ids
                .iter()
                .map(|id| Message::new(id.to_string(), "m", at(i64::from(*id))))
                .collect();
            let unique = ids.iter().collect::<HashSet<_>>().len() == ids.len();
            prop_assert_eq!(MessageCollection::from_messages(messages).is_ok(), unique);
        }
    }
}
