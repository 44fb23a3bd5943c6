//! Server configuration.

use std::fmt;
use zeroize::Zeroizing;

/// Configuration for the message server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Maximum message length in bytes.
    pub max_content_len: usize,
    /// Secret authorizing clear-all. Without one every clear is rejected.
    pub clear_secret: Option<Zeroizing<Vec<u8>>>,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new() -> Self {
        Self {
            max_content_len: 2000,
            clear_secret: None,
        }
    }

    /// Sets the maximum message length.
    pub fn with_max_content_len(mut self, len: usize) -> Self {
        self.max_content_len = len;
        self
    }

    /// Enables clear-all with the given secret.
    pub fn with_clear_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.clear_secret = Some(Zeroizing::new(secret.into()));
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("max_content_len", &self.max_content_len)
            .field("clear_secret", &self.clear_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_content_len, 2000);
        assert!(config.clear_secret.is_none());
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_max_content_len(140)
            .with_clear_secret("s3cret");

        assert_eq!(config.max_content_len, 140);
        assert_eq!(config.clear_secret.as_deref().map(Vec::as_slice), Some(&b"s3cret"[..]));
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
