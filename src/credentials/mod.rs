//! Credential Store
//!
//! Passwords for the compile service live in an external keyed secret
//! store, addressed by a fixed service name and the username. The store is
//! optional: when its executable is missing the capability is simply
//! unavailable.
//!
//! - `CredentialStore` trait: the capability seam
//! - `KeyringCommand`: drives the `keyring` command-line tool
//! - `MemoryCredentialStore`: in-process store for tests

mod keyring;
mod memory;

pub use keyring::KeyringCommand;
pub use memory::{MemoryCredentialStore, StoreCall};

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Service name under which passwords are stored.
pub const SERVICE_NAME: &str = "mbed-rcc";

/// Username used for store lookups when no username could be resolved.
pub const PLACEHOLDER_USERNAME: &str = "default";

/// A password. Never printed by `Debug`, `Display` or `Serialize`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value, for handing to the HTTP client.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

/// Basic-auth credentials for the compile service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Secret,
}

/// Credential store errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential store is not available")]
    Unavailable,

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability interface over an external secret store.
pub trait CredentialStore {
    /// Whether the store can be used at all.
    fn available(&self) -> bool;

    /// Look up the password for `username`. `None` when the store has no
    /// entry or the lookup fails.
    fn get(&self, username: &str) -> Option<Secret>;

    /// Interactively store a password for `username`. Does not return the
    /// secret; callers re-query with [`CredentialStore::get`].
    fn set(&self, username: &str) -> Result<(), CredentialError>;

    /// Remove the password for `username`.
    fn delete(&self, username: &str) -> Result<(), CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"[REDACTED]\"");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_secret_deserializes_from_plain_string() {
        let secret: Secret = serde_json::from_str("\"pw\"").unwrap();
        assert_eq!(secret.expose(), "pw");
    }
}
