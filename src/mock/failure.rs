//! Failure Injection for the mock compile service
//!
//! Supports configurable failure injection for testing error paths.

use std::collections::HashMap;

/// API endpoint a failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    Output,
    Bin,
}

impl Endpoint {
    /// Classify a request path.
    pub fn from_path(path: &str) -> Option<Self> {
        if path == rcc_protocol::paths::START {
            Some(Endpoint::Start)
        } else if path.starts_with(rcc_protocol::paths::OUTPUT) {
            Some(Endpoint::Output)
        } else if path == rcc_protocol::paths::BIN {
            Some(Endpoint::Bin)
        } else {
            None
        }
    }
}

/// Failure configuration for an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureConfig {
    /// HTTP status of the failing response
    pub http_status: u16,
    /// Envelope code to return (None = non-JSON body)
    pub envelope_code: Option<i64>,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// A well-formed envelope with a non-200 code
    pub fn code(code: i64) -> Self {
        Self {
            http_status: 200,
            envelope_code: Some(code),
            fail_count: None,
        }
    }

    /// A bare HTTP error with a non-JSON body
    pub fn http(status: u16) -> Self {
        Self {
            http_status: status,
            envelope_code: None,
            fail_count: None,
        }
    }

    /// Credentials rejected
    pub fn unauthorized() -> Self {
        Self::http(401)
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector for the mock service
#[derive(Debug, Default)]
pub struct FailureInjector {
    /// Per-endpoint failure configs
    configs: HashMap<Endpoint, FailureConfig>,
    /// Call counts per endpoint (for fail_count tracking)
    call_counts: HashMap<Endpoint, u32>,
}

impl FailureInjector {
    /// Create a new failure injector
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a failure for an endpoint
    pub fn set(&mut self, endpoint: Endpoint, config: FailureConfig) {
        self.configs.insert(endpoint, config);
    }

    /// Fail every endpoint
    pub fn set_all(&mut self, config: FailureConfig) {
        for endpoint in [Endpoint::Start, Endpoint::Output, Endpoint::Bin] {
            self.configs.insert(endpoint, config.clone());
        }
    }

    /// Count a call and return the failure to inject, if any
    pub fn check(&mut self, endpoint: Endpoint) -> Option<FailureConfig> {
        let config = self.configs.get(&endpoint)?.clone();
        let count = self.call_counts.entry(endpoint).or_insert(0);
        *count += 1;

        match config.fail_count {
            Some(limit) if *count > limit => None,
            _ => Some(config),
        }
    }
}
