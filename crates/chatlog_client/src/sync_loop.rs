//! Periodic fetch-and-reconcile loop.

use crate::config::{ClientConfig, DEFAULT_POLL_INTERVAL};
use crate::error::{ClientError, ClientResult};
use crate::store::{ApplyOutcome, MessageStore};
use crate::transport::MessageTransport;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Why a fetch was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    /// A tick of the polling schedule.
    Scheduled,
    /// An out-of-band fetch forced by a mutating action.
    Resync,
}

/// Statistics about the polling loop.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Number of calls to `start`, including no-op calls.
    pub start_calls: u64,
    /// Number of times a polling task was actually spawned.
    pub starts: u64,
    /// Total fetches attempted (scheduled and resync).
    pub fetches: u64,
    /// Forced resyncs attempted.
    pub resyncs: u64,
    /// Fetches whose snapshot was installed.
    pub applied: u64,
    /// Fetches whose snapshot was stale or fenced.
    pub discarded: u64,
    /// Fetches that failed.
    pub failed: u64,
    /// Last time a snapshot was installed.
    pub last_sync_time: Option<Instant>,
    /// Last fetch error message.
    pub last_error: Option<String>,
}

/// Fetches snapshots and hands them to the store.
struct Fetcher<T> {
    transport: Arc<T>,
    store: Arc<MessageStore>,
    stats: RwLock<SyncStats>,
}

impl<T: MessageTransport> Fetcher<T> {
    async fn fetch(&self, origin: FetchOrigin) -> ClientResult<ApplyOutcome> {
        let ticket = self.store.issue_ticket();
        {
            let mut stats = self.stats.write();
            stats.fetches += 1;
            if origin == FetchOrigin::Resync {
                stats.resyncs += 1;
            }
        }

        match self.transport.fetch_messages().await {
            Ok(snapshot) => {
                let count = snapshot.len();
                let outcome = self.store.apply(ticket, snapshot);
                let mut stats = self.stats.write();
                if outcome.is_applied() {
                    stats.applied += 1;
                    stats.last_sync_time = Some(Instant::now());
                    stats.last_error = None;
                    debug!(?origin, ticket = ticket.as_u64(), count, "snapshot applied");
                } else {
                    stats.discarded += 1;
                    debug!(?origin, ticket = ticket.as_u64(), ?outcome, "snapshot discarded");
                }
                Ok(outcome)
            }
            Err(e) => {
                {
                    let mut stats = self.stats.write();
                    stats.failed += 1;
                    stats.last_error = Some(e.to_string());
                }
                warn!(?origin, error = %e, "fetch failed, keeping current snapshot");
                Err(e)
            }
        }
    }
}

/// Drives periodic fetches into a [`MessageStore`].
///
/// `start` fetches immediately and then once per interval until `stop`.
/// A failed fetch never touches the store and never ends the schedule; the
/// next tick simply tries again.
pub struct SyncLoop<T> {
    fetcher: Arc<Fetcher<T>>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: MessageTransport> SyncLoop<T> {
    /// Creates a stopped loop.
    pub fn new(config: &ClientConfig, transport: Arc<T>, store: Arc<MessageStore>) -> Self {
        let interval = if config.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            config.poll_interval
        };
        Self {
            fetcher: Arc::new(Fetcher {
                transport,
                store,
                stats: RwLock::new(SyncStats::default()),
            }),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Starts polling. Returns `Ok(false)` if the loop was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> ClientResult<bool> {
        self.fetcher.stats.write().start_calls += 1;

        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("sync loop already running");
            return Ok(false);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        let fetcher = Arc::clone(&self.fetcher);
        let interval = self.interval;
        *task = Some(runtime.spawn(poll(fetcher, interval)));

        self.fetcher.stats.write().starts += 1;
        info!(?interval, "sync loop started");
        Ok(true)
    }

    /// Stops polling. Returns false if the loop was not running.
    ///
    /// A scheduled fetch still in flight is dropped with the task, so its
    /// response is never applied.
    pub fn stop(&self) -> bool {
        match self.task.lock().take() {
            Some(handle) => {
                handle.abort();
                info!("sync loop stopped");
                true
            }
            None => false,
        }
    }

    /// Returns true while the polling task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Fetches immediately, outside the schedule.
    pub async fn resync(&self) -> ClientResult<ApplyOutcome> {
        self.fetcher.fetch(FetchOrigin::Resync).await
    }

    /// Returns the polling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the store this loop feeds.
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.fetcher.store
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.fetcher.stats.read().clone()
    }
}

impl<T> Drop for SyncLoop<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

async fn poll<T: MessageTransport>(fetcher: Arc<Fetcher<T>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        // The first tick completes immediately.
        ticker.tick().await;
        // Failures are logged by `fetch`; the next tick retries.
        let _ = fetcher.fetch(FetchOrigin::Scheduled).await;
    }
}
