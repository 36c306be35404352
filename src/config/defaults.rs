//! Built-in defaults
//!
//! Hardcoded fallbacks for values no layer supplied.

use serde::{Deserialize, Serialize};

/// Name of the overlay file looked up in the home and working directories.
pub const CONFIG_FILE_NAME: &str = ".rcc.toml";

/// Repository built when neither the options nor the VCS name one.
pub const DEFAULT_REPOSITORY: &str = "https://developer.mbed.org/users/mbed_official/code/mbed_blinky/";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// API endpoint of the compile service
    pub endpoint: String,

    /// Repository URL fallback
    pub repository: String,

    /// Maximum number of output polls (default: 50)
    pub poll_attempts: u32,

    /// Seconds between polls (default: 2)
    pub poll_interval_seconds: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            endpoint: rcc_protocol::DEFAULT_ENDPOINT.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            poll_attempts: 50,
            poll_interval_seconds: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.poll_attempts, 50);
        assert_eq!(defaults.poll_interval_seconds, 2);
        assert!(defaults.endpoint.ends_with("/tasks/compiler/"));
        assert_eq!(defaults.repository, DEFAULT_REPOSITORY);
    }
}
