//! One-shot moderation gate and the repeatable clear-all prompt.
//!
//! Before normal operation begins the user decides whether to clear the
//! whole log. The decision flow is:
//!
//! ```text
//! Undecided ──begin_clear──▶ AwaitingSecret ──submit (accepted)──▶ Resolved { cleared: true }
//!     │                        │    ▲
//!     │                        │    └── submit (rejected): secret dropped, state kept
//!     │                        └──cancel──▶ Resolved { cleared: false }
//!     └──decline──▶ Resolved { cleared: false }
//! ```
//!
//! `Resolved` is terminal, and entering it starts the polling loop exactly
//! once.

use crate::dispatcher::ActionDispatcher;
use crate::error::{ClientError, ClientResult};
use crate::secret::Secret;
use crate::sync_loop::SyncLoop;
use crate::transport::MessageTransport;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State of the moderation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No choice made yet.
    Undecided,
    /// The user wants to clear and must supply the secret.
    AwaitingSecret,
    /// The decision is final for this session.
    Resolved {
        /// Whether the log was cleared.
        cleared: bool,
    },
}

impl GateState {
    /// Returns true once the decision is final.
    pub fn is_resolved(&self) -> bool {
        matches!(self, GateState::Resolved { .. })
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Undecided => f.write_str("Undecided"),
            GateState::AwaitingSecret => f.write_str("AwaitingSecret"),
            GateState::Resolved { cleared } => write!(f, "Resolved(cleared={})", cleared),
        }
    }
}

fn invalid_transition(from: GateState, to: &str) -> ClientError {
    ClientError::InvalidStateTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// The one-time decision point in front of a session.
pub struct ModerationGate<T> {
    state: Mutex<GateState>,
    dispatcher: Arc<ActionDispatcher<T>>,
    sync: Arc<SyncLoop<T>>,
}

impl<T: MessageTransport> ModerationGate<T> {
    /// Creates an undecided gate.
    pub fn new(dispatcher: Arc<ActionDispatcher<T>>, sync: Arc<SyncLoop<T>>) -> Self {
        Self {
            state: Mutex::new(GateState::Undecided),
            dispatcher,
            sync,
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> GateState {
        *self.state.lock()
    }

    /// The user wants to consider clearing the log.
    pub fn begin_clear(&self) -> ClientResult<()> {
        let mut state = self.state.lock();
        if *state != GateState::Undecided {
            return Err(invalid_transition(*state, "AwaitingSecret"));
        }
        *state = GateState::AwaitingSecret;
        debug!("moderation gate awaiting secret");
        Ok(())
    }

    /// The user proceeds without clearing.
    pub fn decline(&self) -> ClientResult<()> {
        self.resolve(GateState::Undecided, false)
    }

    /// The user abandons the clear.
    pub fn cancel(&self) -> ClientResult<()> {
        self.resolve(GateState::AwaitingSecret, false)
    }

    /// Submits the secret.
    ///
    /// On acceptance the remote log is cleared and the gate resolves with
    /// `cleared: true`, even if a `cancel` landed while the request was in
    /// flight. On any failure the gate stays in `AwaitingSecret` so the user
    /// can retry or cancel; an authorization failure is reported as
    /// [`ClientError::Unauthorized`]. The secret is dropped in every case.
    pub async fn submit(&self, secret: Secret) -> ClientResult<()> {
        let current = self.state();
        if current != GateState::AwaitingSecret {
            return Err(invalid_transition(current, "submit"));
        }
        require_runtime()?;

        self.dispatcher.clear_remote(secret).await?;

        let previous = std::mem::replace(
            &mut *self.state.lock(),
            GateState::Resolved { cleared: true },
        );
        info!(cleared = true, "moderation gate resolved");
        if previous == GateState::AwaitingSecret {
            self.start_sync()
        } else {
            // The interleaved transition already started the loop.
            debug!(%previous, "gate resolved during clear");
            Ok(())
        }
    }

    fn resolve(&self, from: GateState, cleared: bool) -> ClientResult<()> {
        {
            let mut state = self.state.lock();
            if *state != from {
                return Err(invalid_transition(*state, "Resolved"));
            }
            // Resolved is terminal, so the loop must be startable first.
            require_runtime()?;
            *state = GateState::Resolved { cleared };
        }
        info!(cleared, "moderation gate resolved");
        self.start_sync()
    }

    fn start_sync(&self) -> ClientResult<()> {
        self.sync.start().map(|_| ()).inspect_err(|e| {
            warn!(error = %e, "failed to start sync loop");
        })
    }
}

fn require_runtime() -> ClientResult<()> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|_| ClientError::NoRuntime)
}

/// The repeatable "clear all" prompt available during normal operation.
///
/// Shares the accept/reject logic of the gate but never touches
/// [`GateState`]; it can be opened any number of times.
pub struct ClearAllPrompt<T> {
    open: Mutex<bool>,
    dispatcher: Arc<ActionDispatcher<T>>,
}

impl<T: MessageTransport> ClearAllPrompt<T> {
    /// Creates a closed prompt.
    pub fn new(dispatcher: Arc<ActionDispatcher<T>>) -> Self {
        Self {
            open: Mutex::new(false),
            dispatcher,
        }
    }

    /// Opens the prompt.
    pub fn open(&self) {
        *self.open.lock() = true;
    }

    /// Closes the prompt without clearing.
    pub fn cancel(&self) {
        *self.open.lock() = false;
    }

    /// Returns true while the prompt is open.
    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    /// Submits the secret.
    ///
    /// On success the log is cleared, one resync runs and the prompt closes.
    /// On failure the prompt stays open for another attempt.
    pub async fn confirm(&self, secret: Secret) -> ClientResult<()> {
        if !self.is_open() {
            return Err(ClientError::InvalidStateTransition {
                from: "closed".into(),
                to: "confirm".into(),
            });
        }
        self.dispatcher.clear_all(secret).await?;
        self.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::store::MessageStore;
    use crate::transport::MockTransport;
    use std::time::Duration;

    struct Fixture {
        transport: Arc<MockTransport>,
        sync: Arc<SyncLoop<MockTransport>>,
        gate: ModerationGate<MockTransport>,
        prompt: ClearAllPrompt<MockTransport>,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(MockTransport::new("s3cret"));
        let store = Arc::new(MessageStore::new());
        let sync = Arc::new(SyncLoop::new(
            &ClientConfig::default(),
            Arc::clone(&transport),
            store,
        ));
        let dispatcher = Arc::new(ActionDispatcher::new(
            Arc::clone(&transport),
            Arc::clone(&sync),
        ));
        let gate = ModerationGate::new(Arc::clone(&dispatcher), Arc::clone(&sync));
        let prompt = ClearAllPrompt::new(dispatcher);
        Fixture {
            transport,
            sync,
            gate,
            prompt,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn decline_resolves_and_starts_once() {
        let f = fixture();
        f.transport.seed("hi");
        assert_eq!(f.gate.state(), GateState::Undecided);

        f.gate.decline().unwrap();
        settle().await;

        assert_eq!(f.gate.state(), GateState::Resolved { cleared: false });
        assert_eq!(f.sync.stats().start_calls, 1);
        assert_eq!(f.sync.store().current().len(), 1);

        // Terminal: nothing can re-enter the gate or start the loop again.
        assert!(f.gate.decline().is_err());
        assert!(f.gate.begin_clear().is_err());
        assert!(f.gate.cancel().is_err());
        assert_eq!(f.sync.stats().start_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_secret_keeps_awaiting() {
        let f = fixture();
        f.transport.seed("hi");
        f.gate.begin_clear().unwrap();

        let err = f.gate.submit(Secret::new("wrong")).await.unwrap_err();

        assert!(err.is_authorization_failure());
        assert_eq!(f.gate.state(), GateState::AwaitingSecret);
        assert_eq!(f.sync.stats().start_calls, 0);
        assert_eq!(f.transport.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_secret_clears_then_resolves() {
        let f = fixture();
        f.transport.seed("hi");
        f.gate.begin_clear().unwrap();
        f.gate.submit(Secret::new("wrong")).await.unwrap_err();

        f.gate.submit(Secret::new("s3cret")).await.unwrap();
        settle().await;

        assert_eq!(f.gate.state(), GateState::Resolved { cleared: true });
        assert!(f.transport.messages().is_empty());
        assert_eq!(f.sync.stats().start_calls, 1);
        assert!(f.sync.is_running());
        assert_eq!(f.transport.fetch_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn generic_failure_keeps_awaiting() {
        let f = fixture();
        f.gate.begin_clear().unwrap();
        f.transport.set_unavailable(true);

        let err = f.gate.submit(Secret::new("s3cret")).await.unwrap_err();

        assert!(!err.is_authorization_failure());
        assert_eq!(f.gate.state(), GateState::AwaitingSecret);
        assert_eq!(f.sync.stats().start_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_resolves_without_clearing() {
        let f = fixture();
        f.transport.seed("hi");
        f.gate.begin_clear().unwrap();

        f.gate.cancel().unwrap();
        settle().await;

        assert_eq!(f.gate.state(), GateState::Resolved { cleared: false });
        assert_eq!(f.transport.clear_calls(), 0);
        assert_eq!(f.sync.store().current().len(), 1);
        assert_eq!(f.sync.stats().start_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_clear_still_records_the_clear() {
        let f = fixture();
        f.transport.seed("hi");
        f.transport.set_latency(Duration::from_millis(100));
        f.gate.begin_clear().unwrap();

        let (submitted, cancelled) = tokio::join!(f.gate.submit(Secret::new("s3cret")), async {
            settle().await;
            f.gate.cancel()
        });
        submitted.unwrap();
        cancelled.unwrap();

        assert_eq!(f.gate.state(), GateState::Resolved { cleared: true });
        assert!(f.transport.messages().is_empty());
        assert_eq!(f.sync.stats().start_calls, 1);

        // The fetch started by the cancel predates the clear and is fenced.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(f.sync.store().current().is_empty());
        assert!(f.sync.stats().discarded >= 1);
        assert_eq!(f.sync.stats().start_calls, 1);
    }

    #[test]
    fn resolving_outside_a_runtime_leaves_the_gate_open() {
        let f = fixture();

        let err = f.gate.decline().unwrap_err();
        assert!(matches!(err, ClientError::NoRuntime));
        assert_eq!(f.gate.state(), GateState::Undecided);

        f.gate.begin_clear().unwrap();
        assert!(matches!(f.gate.cancel(), Err(ClientError::NoRuntime)));
        assert_eq!(f.gate.state(), GateState::AwaitingSecret);
        assert_eq!(f.sync.stats().starts, 0);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            f.gate.cancel().unwrap();
            assert!(f.sync.is_running());
        });
        assert_eq!(f.gate.state(), GateState::Resolved { cleared: false });
    }

    #[tokio::test]
    async fn submit_requires_awaiting_secret() {
        let f = fixture();
        let err = f.gate.submit(Secret::new("s3cret")).await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidStateTransition { .. }));
        assert_eq!(f.transport.clear_calls(), 0);
        assert_eq!(f.gate.state(), GateState::Undecided);
        assert!(f.gate.cancel().is_err());
    }

    #[tokio::test]
    async fn prompt_is_independent_of_gate() {
        let f = fixture();
        f.transport.seed("hi");

        assert!(f.prompt.confirm(Secret::new("s3cret")).await.is_err());
        assert_eq!(f.transport.clear_calls(), 0);

        f.prompt.open();
        let err = f.prompt.confirm(Secret::new("wrong")).await.unwrap_err();
        assert!(err.is_authorization_failure());
        assert!(f.prompt.is_open());
        assert_eq!(f.sync.stats().resyncs, 0);

        f.prompt.confirm(Secret::new("s3cret")).await.unwrap();
        assert!(!f.prompt.is_open());
        assert_eq!(f.sync.stats().resyncs, 1);
        assert!(f.transport.messages().is_empty());

        // Re-enterable, and never moves the gate.
        f.prompt.open();
        f.prompt.cancel();
        assert!(!f.prompt.is_open());
        assert_eq!(f.gate.state(), GateState::Undecided);
        assert_eq!(f.sync.stats().start_calls, 0);
    }

    #[test]
    fn state_display() {
        assert_eq!(GateState::Undecided.to_string(), "Undecided");
        assert_eq!(
            GateState::Resolved { cleared: true }.to_string(),
            "Resolved(cleared=true)"
        );
        assert!(GateState::Resolved { cleared: false }.is_resolved());
        assert!(!GateState::AwaitingSecret.is_resolved());
    }
}
