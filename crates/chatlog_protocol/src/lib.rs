//! # Chatlog Protocol
//!
//! Message types and the JSON wire format shared by the chatlog client and
//! the reference server.
//!
//! This crate provides:
//! - `Message` and `MessageCollection` (full snapshots with unique ids)
//! - Request bodies for create and clear-all
//! - Transport-neutral `HttpRequest`/`HttpResponse` envelopes and routes
//! - Content validation shared by both ends
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod error;
mod message;

pub use api::{
    message_path, validate_content, ClearMessagesRequest, CreateMessageRequest, ErrorBody,
    HttpRequest, HttpResponse, Method, MESSAGES_PATH,
};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Message, MessageCollection, MessageId};
