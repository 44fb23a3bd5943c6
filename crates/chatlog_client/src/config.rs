//! Configuration for the chatlog client.

use std::time::Duration;

/// Default cadence of the polling loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration for a client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the message service; every endpoint, including clear-all,
    /// is resolved against it.
    pub base_url: String,
    /// Interval between scheduled fetches.
    pub poll_interval: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8080")
    }
}
