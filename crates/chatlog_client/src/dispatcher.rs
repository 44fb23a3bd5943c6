//! User-initiated mutations followed by forced resyncs.

use crate::error::ClientResult;
use crate::secret::Secret;
use crate::sync_loop::SyncLoop;
use crate::transport::MessageTransport;
use chatlog_protocol::{CreateMessageRequest, Message, MessageId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sends post, delete-one and clear-all requests.
///
/// Every successful mutation is followed by one immediate resync instead of
/// waiting for the next scheduled tick. The store itself is never edited
/// directly; the resync is the only path by which a mutation becomes
/// visible locally. Failed mutations trigger no resync.
pub struct ActionDispatcher<T> {
    transport: Arc<T>,
    sync: Arc<SyncLoop<T>>,
}

impl<T: MessageTransport> ActionDispatcher<T> {
    /// Creates a dispatcher resyncing through `sync`.
    pub fn new(transport: Arc<T>, sync: Arc<SyncLoop<T>>) -> Self {
        Self { transport, sync }
    }

    /// Posts a message.
    ///
    /// Empty or whitespace-only content is rejected before any request is
    /// made.
    pub async fn post(&self, content: &str) -> ClientResult<Message> {
        let request = CreateMessageRequest::new(content)?;
        let created = self
            .transport
            .create_message(&request)
            .await
            .inspect_err(|e| warn!(error = %e, "post failed"))?;
        debug!(id = %created.id, "message posted");
        self.resync().await;
        Ok(created)
    }

    /// Posts the draft and clears it, but only if the post succeeded.
    pub async fn submit_draft(&self, draft: &mut String) -> ClientResult<Message> {
        let created = self.post(draft).await?;
        draft.clear();
        Ok(created)
    }

    /// Deletes one message. A message that is already gone counts as
    /// deleted.
    ///
    /// Ids that are not a single path segment are rejected before any
    /// request is made.
    pub async fn delete_one(&self, id: &MessageId) -> ClientResult<()> {
        id.validate()?;
        self.transport
            .delete_message(id)
            .await
            .inspect_err(|e| warn!(%id, error = %e, "delete failed"))?;
        debug!(%id, "message deleted");
        self.resync().await;
        Ok(())
    }

    /// Clears the whole log, then resyncs once.
    ///
    /// A wrong secret yields an authorization failure and no resync; the
    /// secret is dropped either way.
    pub async fn clear_all(&self, secret: Secret) -> ClientResult<()> {
        self.clear_remote(secret).await?;
        self.resync().await;
        Ok(())
    }

    /// Clears the whole log without resyncing.
    ///
    /// Used by the moderation gate, whose transition starts the polling loop
    /// and with it the first fetch.
    pub async fn clear_remote(&self, secret: Secret) -> ClientResult<()> {
        let result = self.transport.clear_messages(&secret).await;
        drop(secret);
        match result {
            Ok(()) => {
                // Fetches already in flight describe the log before the clear.
                self.sync.store().fence();
                info!("message log cleared");
                Ok(())
            }
            Err(e) => {
                if e.is_authorization_failure() {
                    warn!("clear rejected: invalid credential");
                } else {
                    warn!(error = %e, "clear failed");
                }
                Err(e)
            }
        }
    }

    async fn resync(&self) {
        // The mutation already succeeded; a failed resync is recovered by
        // the next scheduled tick and is not reported to the caller.
        let _ = self.sync.resync().await;
    }
}
