//! A client session wiring store, polling loop, dispatcher and gate.

use crate::config::ClientConfig;
use crate::dispatcher::ActionDispatcher;
use crate::gate::{ClearAllPrompt, ModerationGate};
use crate::store::MessageStore;
use crate::sync_loop::SyncLoop;
use crate::transport::MessageTransport;
use chatlog_protocol::MessageCollection;
use std::sync::Arc;

/// One client session against the message service.
///
/// The polling loop is only started by the moderation gate; until the gate
/// resolves the store stays empty unless an action forces a resync.
pub struct ClientSession<T> {
    config: ClientConfig,
    store: Arc<MessageStore>,
    sync: Arc<SyncLoop<T>>,
    dispatcher: Arc<ActionDispatcher<T>>,
    gate: ModerationGate<T>,
    clear_prompt: ClearAllPrompt<T>,
}

impl<T: MessageTransport> ClientSession<T> {
    /// Creates a session with an undecided gate and a stopped loop.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let transport = Arc::new(transport);
        let store = Arc::new(MessageStore::new());
        let sync = Arc::new(SyncLoop::new(
            &config,
            Arc::clone(&transport),
            Arc::clone(&store),
        ));
        let dispatcher = Arc::new(ActionDispatcher::new(transport, Arc::clone(&sync)));
        let gate = ModerationGate::new(Arc::clone(&dispatcher), Arc::clone(&sync));
        let clear_prompt = ClearAllPrompt::new(Arc::clone(&dispatcher));

        Self {
            config,
            store,
            sync,
            dispatcher,
            gate,
            clear_prompt,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the latest snapshot.
    pub fn messages(&self) -> Arc<MessageCollection> {
        self.store.current()
    }

    /// Returns the message store.
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    /// Returns the polling loop.
    pub fn sync_loop(&self) -> &Arc<SyncLoop<T>> {
        &self.sync
    }

    /// Returns the action dispatcher.
    pub fn dispatcher(&self) -> &ActionDispatcher<T> {
        &self.dispatcher
    }

    /// Returns the moderation gate.
    pub fn gate(&self) -> &ModerationGate<T> {
        &self.gate
    }

    /// Returns the repeatable clear-all prompt.
    pub fn clear_prompt(&self) -> &ClearAllPrompt<T> {
        &self.clear_prompt
    }

    /// Stops polling. Returns false if the loop was not running.
    pub fn shutdown(&self) -> bool {
        self.sync.stop()
    }
}

#[cfg(feature = "reqwest")]
impl ClientSession<crate::http::HttpTransport<crate::http::ReqwestClient>> {
    /// Creates a session talking HTTP to `config.base_url`.
    pub fn connect(config: ClientConfig) -> crate::error::ClientResult<Self> {
        let client = crate::http::ReqwestClient::new(&config)?;
        let transport = crate::http::HttpTransport::new(config.base_url.clone(), client);
        Ok(Self::new(config, transport))
    }
}
