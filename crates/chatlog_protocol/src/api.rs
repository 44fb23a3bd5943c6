//! Request/response envelopes and routes of the message service.
//!
//! The envelopes are deliberately transport-neutral: the client hands them to
//! whichever HTTP library it is built with, and the reference server consumes
//! them directly in loopback tests.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use zeroize::Zeroizing;

/// Collection route. `GET` lists, `POST` creates, `DELETE` clears.
pub const MESSAGES_PATH: &str = "/api/messages";

/// Route of a single message.
///
/// Fails for ids that are not a single path segment, so a crafted id can
/// never address another message or the collection route.
pub fn message_path(id: &crate::MessageId) -> ProtocolResult<String> {
    Ok(format!("{}/{}", MESSAGES_PATH, id.validate()?))
}

/// Rejects empty or whitespace-only content.
///
/// The content itself is returned untouched; trimming is only used for the
/// emptiness check.
pub fn validate_content(content: &str) -> ProtocolResult<&str> {
    if content.trim().is_empty() {
        Err(ProtocolError::EmptyContent)
    } else {
        Ok(content)
    }
}

/// HTTP method subset used by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// DELETE.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
            Method::Delete => f.write_str("DELETE"),
        }
    }
}

/// An outgoing request relative to the service base URL.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Path, starting with `/`.
    pub path: String,
    /// JSON body, if any. Wiped when the request is dropped.
    pub body: Option<Zeroizing<Vec<u8>>>,
}

impl HttpRequest {
    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Creates a DELETE request without a body.
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }

    /// Creates a request carrying a JSON body.
    pub fn with_json<T: Serialize>(
        method: Method,
        path: impl Into<String>,
        body: &T,
    ) -> ProtocolResult<Self> {
        Ok(Self {
            method,
            path: path.into(),
            body: Some(Zeroizing::new(serde_json::to_vec(body)?)),
        })
    }

    /// Decodes the JSON body.
    pub fn json<'de, T: Deserialize<'de>>(&'de self) -> ProtocolResult<T> {
        let body = self.body.as_ref().map_or(b"null".as_slice(), |b| b.as_slice());
        Ok(serde_json::from_slice(body)?)
    }
}

// Bodies can carry credentials, so only their size is printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("body_len", &self.body.as_ref().map(|b| b.len()))
            .finish()
    }
}

/// A response from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// Creates a response with a JSON body.
    pub fn json<T: Serialize>(status: u16, body: &T) -> ProtocolResult<Self> {
        Ok(Self {
            status,
            body: serde_json::to_vec(body)?,
        })
    }

    /// Creates an error response with an `{"error": ...}` body.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = ErrorBody {
            error: message.into(),
        };
        Self {
            status,
            body: serde_json::to_vec(&body).unwrap_or_default(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the JSON body.
    pub fn decode<'de, T: Deserialize<'de>>(&'de self) -> ProtocolResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Best-effort error text: the `error` field if present, else the body.
    pub fn error_message(&self) -> String {
        match serde_json::from_slice::<ErrorBody>(&self.body) {
            Ok(body) => body.error,
            Err(_) if self.body.is_empty() => format!("status {}", self.status),
            Err(_) => String::from_utf8_lossy(&self.body).into_owned(),
        }
    }
}

/// Body of `POST /api/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    /// Text content.
    pub content: String,
}

impl CreateMessageRequest {
    /// Creates a request, rejecting empty content.
    pub fn new(content: impl Into<String>) -> ProtocolResult<Self> {
        let content = content.into();
        validate_content(&content)?;
        Ok(Self { content })
    }
}

/// Body of `DELETE /api/messages`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClearMessagesRequest<'a> {
    /// Shared secret authorizing the clear.
    #[serde(borrow)]
    pub password: Cow<'a, str>,
}

impl<'a> ClearMessagesRequest<'a> {
    /// Creates a request borrowing the secret.
    pub fn new(password: &'a str) -> Self {
        Self {
            password: Cow::Borrowed(password),
        }
    }
}

impl fmt::Debug for ClearMessagesRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClearMessagesRequest")
            .field("password", &"***")
            .finish()
    }
}

/// JSON error body returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageId;

    #[test]
    fn routes() {
        assert_eq!(MESSAGES_PATH, "/api/messages");
        assert_eq!(message_path(&MessageId::new("42")).unwrap(), "/api/messages/42");
        assert!(message_path(&MessageId::new("42?x")).is_err());
        assert!(message_path(&MessageId::new("../42")).is_err());
    }

    #[test]
    fn content_validation() {
        assert!(validate_content("").is_err());
        assert!(validate_content("   ").is_err());
        assert!(validate_content("\n\t").is_err());
        assert_eq!(validate_content("  hi ").unwrap(), "  hi ");
        assert!(CreateMessageRequest::new(" ").is_err());
    }

    #[test]
    fn clear_request_wire_shape() {
        let request = ClearMessagesRequest::new("hunter2");
        let http = HttpRequest::with_json(Method::Delete, MESSAGES_PATH, &request).unwrap();
        let value: serde_json::Value = http.json().unwrap();
        assert_eq!(value["password"], "hunter2");

        let decoded: ClearMessagesRequest<'_> = http.json().unwrap();
        assert_eq!(decoded.password, "hunter2");
    }

    #[test]
    fn credential_body_is_wiped_and_never_printed() {
        use zeroize::Zeroize;

        let request = ClearMessagesRequest::new("hunter2");
        let mut http = HttpRequest::with_json(Method::Delete, MESSAGES_PATH, &request).unwrap();
        assert!(!format!("{:?}", http).contains("hunter2"));

        // The body is held in a `Zeroizing` buffer, which runs this on drop.
        let body: &mut Zeroizing<Vec<u8>> = http.body.as_mut().unwrap();
        body.zeroize();
        assert!(body.is_empty());
        assert!(!String::from_utf8_lossy(body.as_slice()).contains("hunter2"));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let request = ClearMessagesRequest::new("hunter2");
        assert!(!format!("{:?}", request).contains("hunter2"));

        let http = HttpRequest::with_json(Method::Delete, MESSAGES_PATH, &request).unwrap();
        assert!(!format!("{:?}", http).contains("hunter2"));
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(HttpResponse::error(401, "bad password").error_message(), "bad password");
        assert_eq!(HttpResponse::empty(503).error_message(), "status 503");
        let plain = HttpResponse {
            status: 500,
            body: b"boom".to_vec(),
        };
        assert_eq!(plain.error_message(), "boom");
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::empty(200).is_success());
        assert!(HttpResponse::empty(204).is_success());
        assert!(!HttpResponse::empty(401).is_success());
        assert!(!HttpResponse::empty(500).is_success());
    }
}
