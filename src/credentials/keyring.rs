//! `keyring` command-line backend.

use std::io;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::{CredentialError, CredentialStore, Secret, SERVICE_NAME};

/// Credential store backed by the `keyring` executable.
///
/// Availability is checked once, at construction, by running the help
/// action. A missing executable makes the store unavailable; it is not an
/// error.
#[derive(Debug, Clone)]
pub struct KeyringCommand {
    program: String,
    service: String,
    available: bool,
}

impl KeyringCommand {
    /// Detect the `keyring` executable on `PATH`.
    pub fn detect() -> Self {
        Self::detect_program("keyring")
    }

    /// Detect a specific executable.
    pub fn detect_program(program: impl Into<String>) -> Self {
        let program = program.into();
        let available = responds(&program);
        debug!(program = %program, available, "detected credential store");
        Self {
            program,
            service: SERVICE_NAME.to_string(),
            available,
        }
    }

    fn command(&self, action: &str, username: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args([action, self.service.as_str(), username]);
        cmd
    }

    fn run_interactive(&self, action: &str, username: &str) -> Result<(), CredentialError> {
        if !self.available {
            return Err(CredentialError::Unavailable);
        }

        let status = self
            .command(action, username)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if !status.success() {
            return Err(CredentialError::CommandFailed {
                command: format!("{} {} {}", self.program, action, self.service),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

fn responds(program: &str) -> bool {
    match Command::new(program)
        .arg("-h")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(program, error = %e, "credential store check failed");
            false
        }
    }
}

impl CredentialStore for KeyringCommand {
    fn available(&self) -> bool {
        self.available
    }

    fn get(&self, username: &str) -> Option<Secret> {
        if !self.available {
            return None;
        }

        let output = match self.command("get", username).stdin(Stdio::null()).output() {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "credential lookup failed");
                return None;
            }
        };

        if !output.status.success() {
            debug!(username, status = %output.status, "no stored password");
            return None;
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(Secret::new(value))
    }

    fn set(&self, username: &str) -> Result<(), CredentialError> {
        self.run_interactive("set", username)
    }

    fn delete(&self, username: &str) -> Result<(), CredentialError> {
        self.run_interactive("del", username)
    }
}
