//! The client's view of the server's message log.

use chatlog_protocol::MessageCollection;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies one fetch so its result can be ordered against other fetches.
///
/// Tickets are issued in strictly increasing order before the request is
/// sent; a response is only installed if no newer fetch has been installed
/// already and the ticket is not behind the clear fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    /// Returns the raw sequence number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// What happened to a fetched snapshot handed to [`MessageStore::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The snapshot replaced the current view.
    Applied,
    /// A newer fetch was already installed.
    Stale,
    /// The fetch started before the last successful clear.
    Fenced,
}

impl ApplyOutcome {
    /// Returns true if the snapshot was installed.
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

struct StoreState {
    snapshot: Arc<MessageCollection>,
    applied_ticket: u64,
    fence: u64,
    version: u64,
}

/// Holds the latest snapshot of the message log.
///
/// Snapshots are swapped in whole: readers get an `Arc` to a complete
/// collection and never observe a partially written one.
pub struct MessageStore {
    state: RwLock<StoreState>,
    next_ticket: AtomicU64,
}

impl MessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                snapshot: Arc::new(MessageCollection::new()),
                applied_ticket: 0,
                fence: 0,
                version: 0,
            }),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Returns the latest applied snapshot. Empty before the first fetch.
    pub fn current(&self) -> Arc<MessageCollection> {
        Arc::clone(&self.state.read().snapshot)
    }

    /// Replaces the view unconditionally. Last write wins.
    pub fn replace_all(&self, snapshot: MessageCollection) {
        let snapshot = Arc::new(snapshot);
        let mut state = self.state.write();
        state.snapshot = snapshot;
        state.version += 1;
    }

    /// Issues a ticket for a fetch that is about to be sent.
    pub fn issue_ticket(&self) -> FetchTicket {
        FetchTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    /// Installs a fetched snapshot unless it is stale or fenced.
    pub fn apply(&self, ticket: FetchTicket, snapshot: MessageCollection) -> ApplyOutcome {
        let snapshot = Arc::new(snapshot);
        let mut state = self.state.write();
        if ticket.0 <= state.fence {
            return ApplyOutcome::Fenced;
        }
        if ticket.0 <= state.applied_ticket {
            return ApplyOutcome::Stale;
        }
        state.snapshot = snapshot;
        state.applied_ticket = ticket.0;
        state.version += 1;
        ApplyOutcome::Applied
    }

    /// Rejects every fetch issued so far.
    ///
    /// Called after a successful clear so that a response describing the log
    /// from before the clear can never be installed afterwards.
    pub fn fence(&self) {
        let issued = self.next_ticket.load(Ordering::SeqCst).saturating_sub(1);
        let mut state = self.state.write();
        state.fence = state.fence.max(issued);
    }

    /// Returns how many snapshots have been installed.
    pub fn version(&self) -> u64 {
        self.state.read().version
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}
