//! # Chatlog Server
//!
//! In-memory reference implementation of the chatlog message service.
//!
//! This crate provides:
//! - An ordered message log with server-assigned ids and timestamps
//! - Request routing for list, create, delete-one and clear-all
//! - Shared-secret authorization of clear-all (HMAC-SHA256, constant time)
//!
//! # Endpoints
//!
//! | Method   | Path                 | Body           | Success |
//! |----------|----------------------|----------------|---------|
//! | `GET`    | `/api/messages`      |                | 200     |
//! | `POST`   | `/api/messages`      | `{content}`    | 201     |
//! | `DELETE` | `/api/messages/{id}` |                | 204     |
//! | `DELETE` | `/api/messages`      | `{password}`   | 200     |
//!
//! Errors carry a `{"error": ...}` body; a wrong clear secret yields 401.
//!
//! The server speaks the transport-neutral envelopes of `chatlog_protocol`
//! and does no I/O of its own, so it can back loopback clients in tests or
//! sit behind any HTTP front end.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod log;
mod server;

pub use auth::ClearAuthorizer;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use log::MessageLog;
pub use server::MessageServer;
