//! # Chatlog Client
//!
//! Client-side synchronization and moderation for the chatlog message
//! service.
//!
//! This crate provides:
//! - `MessageStore`: the latest full snapshot of the shared log
//! - `SyncLoop`: fixed-interval polling with start/stop lifecycle
//! - `ModerationGate`: the one-time, secret-protected clear decision
//! - `ActionDispatcher`: post, delete-one and clear-all with forced resync
//! - Transport abstraction with HTTP, loopback and mock implementations
//!
//! ## Architecture
//!
//! The server is authoritative. The client never edits its view directly;
//! every change arrives as a full snapshot, either from a scheduled poll or
//! from a resync forced by a mutation.
//!
//! ```text
//! ModerationGate ──resolve──▶ SyncLoop::start ──poll──▶ MessageStore
//! ActionDispatcher ──mutate──▶ transport ──resync──▶ MessageStore
//! ```
//!
//! ## Key Invariants
//!
//! - Snapshots replace the view atomically; readers never see a partial one
//! - A failed fetch never changes the view and never stops polling
//! - The polling loop starts exactly once, when the gate resolves
//! - Secrets are consumed by value and wiped on drop, never logged
//! - A response from before a successful clear is never installed after it

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatcher;
mod error;
mod gate;
mod http;
mod secret;
mod session;
mod store;
mod sync_loop;
mod transport;

pub use config::{ClientConfig, DEFAULT_POLL_INTERVAL};
pub use dispatcher::ActionDispatcher;
pub use error::{ClientError, ClientResult};
pub use gate::{ClearAllPrompt, GateState, ModerationGate};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use http::{HttpClient, HttpTransport, LoopbackClient, LoopbackServer};
pub use secret::Secret;
pub use session::ClientSession;
pub use store::{ApplyOutcome, FetchTicket, MessageStore};
pub use sync_loop::{FetchOrigin, SyncLoop, SyncStats};
pub use transport::{MessageTransport, MockTransport};

pub use chatlog_protocol::{Message, MessageCollection, MessageId};
