//! Top-level error type
//!
//! Module errors fold into [`Error`], whose [`FailureKind`] fixes the
//! process exit code.

use crate::config::ConfigError;
use crate::host::{SessionError, TransportError};
use crate::options::ConfigurationError;
use crate::timeout::PollError;

/// Failure kind for exit code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport, I/O or unclassified failures (exit code 1)
    Other = 1,
    /// Missing or invalid options (exit code 2)
    Configuration = 2,
    /// Credentials rejected (exit code 3)
    Auth = 3,
    /// Unexpected response from the service (exit code 4)
    Api = 4,
    /// The build finished with errors (exit code 5)
    CompileFailure = 5,
    /// The build did not finish within the poll budget (exit code 6)
    PollTimeout = 6,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Build did not complete after {attempts} polls")]
    PollTimeout { attempts: u32 },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PollError> for Error {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Session(e) => Error::Session(e),
            PollError::Timeout { attempts } => Error::PollTimeout { attempts },
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Configuration(ConfigurationError::Config(err))
    }
}

impl Error {
    /// Map error to failure kind for exit code
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Configuration(_) => FailureKind::Configuration,
            Error::Session(e) => match e {
                SessionError::Auth { .. } => FailureKind::Auth,
                SessionError::Api { .. } | SessionError::Protocol(_) => FailureKind::Api,
                SessionError::CompileFailure { .. } => FailureKind::CompileFailure,
                _ => FailureKind::Other,
            },
            Error::PollTimeout { .. } => FailureKind::PollTimeout,
            Error::Transport(TransportError::InvalidEndpoint { .. }) => FailureKind::Configuration,
            Error::Transport(_) | Error::Io(_) => FailureKind::Other,
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.failure_kind() as i32
    }
}

/// Result type for top-level operations
pub type Result<T> = std::result::Result<T, Error>;
