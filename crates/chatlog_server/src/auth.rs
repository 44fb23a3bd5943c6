//! Authorization of clear-all requests.
//!
//! The configured secret is never compared directly. Both the configured
//! secret and the candidate are used as HMAC-SHA256 keys over a fixed label,
//! and the tags are compared in constant time, so neither the content nor
//! the length of the secret leaks through timing.

use crate::error::{ServerError, ServerResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const CLEAR_LABEL: &[u8] = b"chatlog/clear-all";

/// Checks clear-all secrets.
#[derive(Clone)]
pub struct ClearAuthorizer {
    expected: Option<[u8; 32]>,
}

impl ClearAuthorizer {
    /// Creates an authorizer for `secret`. With `None` every request is
    /// rejected.
    pub fn new(secret: Option<&[u8]>) -> ServerResult<Self> {
        let expected = match secret {
            Some(secret) => Some(tag(secret)?.finalize().into_bytes().into()),
            None => None,
        };
        Ok(Self { expected })
    }

    /// Returns true if a secret is configured.
    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    /// Verifies a candidate secret.
    pub fn verify(&self, candidate: &str) -> ServerResult<()> {
        let expected = self
            .expected
            .ok_or_else(|| ServerError::NotAuthorized("clear-all is disabled".into()))?;
        tag(candidate.as_bytes())?
            .verify_slice(&expected)
            .map_err(|_| ServerError::NotAuthorized("invalid password".into()))
    }
}

fn tag(key: &[u8]) -> ServerResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ServerError::Internal(format!("hmac key: {}", e)))?;
    mac.update(CLEAR_LABEL);
    Ok(mac)
}
