//! In-memory credential for gated clear operations.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A shared secret authorizing a clear-all.
///
/// The value lives only in memory. It is not `Clone`, every gated operation
/// takes it by value, and the backing buffer is wiped when it is dropped, so
/// a secret is gone once the operation that used it returns.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Wraps a credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the credential for placing on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
    }

    #[test]
    fn expose_and_zeroize() {
        let mut secret = Secret::from("hunter2");
        assert_eq!(secret.expose(), "hunter2");
        assert!(!secret.is_empty());

        secret.zeroize();
        assert!(secret.is_empty());
    }
}
