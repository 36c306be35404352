//! Compile options
//!
//! Everything one compile needs, resolved from explicit flags, the config
//! overlay, the working copy and built-in defaults. See
//! [`OptionResolver`] for the precedence rules.

mod resolver;

pub use resolver::OptionResolver;

use std::env;
use std::path::PathBuf;

use crate::config::{ConfigError, OptionLayer, DEFAULT_REPOSITORY};
use crate::credentials::{CredentialError, Secret, PLACEHOLDER_USERNAME};
use crate::timeout::{PollBudget, PollBudgetError};

/// Fully resolved options for one compile.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    pub repository: String,
    pub username: Option<String>,
    /// Only set when given explicitly or in an overlay; otherwise looked up
    /// when credentials are first needed.
    pub password: Option<Secret>,
    pub platform: String,
    pub output_dir: PathBuf,
    /// Deduplicated and sorted.
    pub replace_files: Vec<PathBuf>,
    pub clean: bool,
    pub extra_symbols: Option<String>,
    pub endpoint: String,
    pub poll_budget: PollBudget,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            username: None,
            password: None,
            platform: String::new(),
            output_dir: PathBuf::from("."),
            replace_files: Vec::new(),
            clean: false,
            extra_symbols: None,
            endpoint: rcc_protocol::DEFAULT_ENDPOINT.to_string(),
            poll_budget: PollBudget::default(),
        }
    }
}

impl CompileOptions {
    /// Username for credential-store lookups.
    pub fn lookup_username(&self) -> &str {
        self.username.as_deref().unwrap_or(PLACEHOLDER_USERNAME)
    }
}

/// Options given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ExplicitOptions {
    pub values: OptionLayer,
    /// Remove the stored password before resolving it.
    pub delete_password: bool,
}

/// Process-level inputs to option resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
}

impl Environment {
    /// Capture the current directory and `$HOME`.
    pub fn from_process() -> std::io::Result<Self> {
        Ok(Self {
            cwd: env::current_dir()?,
            home: env::var_os("HOME").map(PathBuf::from),
        })
    }
}

/// Option resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Missing required option: {0}")]
    MissingRequired(&'static str),

    #[error("Output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("No password given and the `keyring` credential store is not installed; install keyring or pass --password")]
    CredentialStoreUnavailable,

    #[error("No password available for user `{0}`")]
    PasswordUnavailable(String),

    #[error("Invalid poll budget: {0}")]
    PollBudget(#[from] PollBudgetError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Credential store error: {0}")]
    Credential(#[from] CredentialError),
}
