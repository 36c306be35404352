//! Option resolution
//!
//! Per-field precedence, highest first:
//! explicit > overlay > working copy / derived > built-in default.
//!
//! | field          | derived from                  | fallback          |
//! |----------------|-------------------------------|-------------------|
//! | repository     | `hg config paths.default`     | mbed_blinky URL   |
//! | username       | user-info of the repository   | unset             |
//! | password       | credential store, lazily      | error             |
//! | output_dir     |                               | current directory |
//! | replace_files  | `hg status` changes, merged   | empty             |
//! | platform       |                               | required          |

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use url::Url;

use super::{CompileOptions, ConfigurationError, Environment, ExplicitOptions};
use crate::config::{overlay, BuiltinDefaults, Overlay};
use crate::credentials::{CredentialStore, Credentials};
use crate::timeout::PollBudget;
use crate::vcs::{ChangeSetCollector, VersionControl};

/// Resolves [`CompileOptions`] against a VCS and a credential store.
pub struct OptionResolver<'a> {
    vcs: &'a dyn VersionControl,
    store: &'a dyn CredentialStore,
    defaults: BuiltinDefaults,
}

impl<'a> OptionResolver<'a> {
    pub fn new(vcs: &'a dyn VersionControl, store: &'a dyn CredentialStore) -> Self {
        Self {
            vcs,
            store,
            defaults: BuiltinDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: BuiltinDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Resolve every option except the password, which is left to
    /// [`OptionResolver::resolve_credentials`] unless given explicitly.
    pub fn resolve(
        &self,
        explicit: &ExplicitOptions,
        config: &Overlay,
        env: &Environment,
    ) -> Result<CompileOptions, ConfigurationError> {
        let merged = overlay(config.options.clone(), explicit.values.clone());

        let repository = merged
            .repository
            .or_else(|| self.vcs.default_path())
            .unwrap_or_else(|| self.defaults.repository.clone());

        let username = merged.username.or_else(|| username_from_url(&repository));

        let output_dir = resolve_dir(merged.output_dir, &env.cwd);
        if !output_dir.is_dir() {
            return Err(ConfigurationError::OutputDirMissing(output_dir));
        }

        let poll_budget = PollBudget::from_config(
            merged.poll_attempts.or(Some(self.defaults.poll_attempts)),
            merged.poll_interval_seconds.or(Some(self.defaults.poll_interval_seconds)),
        );
        poll_budget.validate()?;

        let platform = check_required(merged.platform)?;

        if explicit.delete_password {
            self.delete_password(username.as_deref())?;
        }

        let explicit_files = merged.replace_files.unwrap_or_default();
        let replace_files = ChangeSetCollector::new(self.vcs).collect(&explicit_files);

        let options = CompileOptions {
            repository,
            username,
            password: merged.password,
            platform,
            output_dir,
            replace_files,
            clean: merged.clean.unwrap_or(false),
            extra_symbols: merged.extra_symbols.filter(|s| !s.is_empty()),
            endpoint: merged.endpoint.unwrap_or_else(|| self.defaults.endpoint.clone()),
            poll_budget,
        };
        debug!(
            repository = %options.repository,
            username = ?options.username,
            platform = %options.platform,
            output_dir = %options.output_dir.display(),
            replace_files = options.replace_files.len(),
            "options resolved"
        );
        Ok(options)
    }

    /// Credentials for the compile service.
    ///
    /// A password already in `options` wins. Otherwise the store is asked;
    /// when it has no entry the user is prompted through the store and the
    /// store is asked again.
    pub fn resolve_credentials(&self, options: &CompileOptions) -> Result<Credentials, ConfigurationError> {
        let username = options.lookup_username().to_string();

        if let Some(ref password) = options.password {
            return Ok(Credentials {
                username,
                password: password.clone(),
            });
        }

        if !self.store.available() {
            return Err(ConfigurationError::CredentialStoreUnavailable);
        }

        let password = match self.store.get(&username) {
            Some(password) => password,
            None => {
                info!(username = %username, "no stored password, prompting");
                self.store.set(&username)?;
                self.store
                    .get(&username)
                    .ok_or_else(|| ConfigurationError::PasswordUnavailable(username.clone()))?
            }
        };

        Ok(Credentials { username, password })
    }

    fn delete_password(&self, username: Option<&str>) -> Result<(), ConfigurationError> {
        if !self.store.available() {
            warn!("credential store not available, nothing to delete");
            return Ok(());
        }
        let username = username.unwrap_or(crate::credentials::PLACEHOLDER_USERNAME);
        info!(username = %username, "deleting stored password");
        self.store.delete(username)?;
        Ok(())
    }
}

/// Only the first missing required option is reported.
fn check_required(platform: Option<String>) -> Result<String, ConfigurationError> {
    match platform {
        Some(platform) if !platform.is_empty() => Ok(platform),
        _ => Err(ConfigurationError::MissingRequired("platform")),
    }
}

fn resolve_dir(dir: Option<PathBuf>, cwd: &Path) -> PathBuf {
    match dir {
        Some(dir) if dir.is_relative() => cwd.join(dir),
        Some(dir) => dir,
        None => cwd.to_path_buf(),
    }
}

/// User-info part of a repository URL, e.g. `alice` in
/// `https://alice@developer.mbed.org/...`.
fn username_from_url(repository: &str) -> Option<String> {
    let url = Url::parse(repository).ok()?;
    let username = url.username();
    if username.is_empty() {
        None
    } else {
        Some(username.to_string())
    }
}
