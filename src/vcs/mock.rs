//! Scripted VCS for tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{VcsError, VersionControl};

/// A [`VersionControl`] that returns canned answers.
#[derive(Debug, Default)]
pub struct MockVcs {
    available: bool,
    default_path: Option<String>,
    root: Option<PathBuf>,
    status_lines: Vec<String>,
    status_fails: bool,
    status_calls: AtomicUsize,
}

impl MockVcs {
    /// An available VCS with no default path and a clean working copy.
    pub fn new() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    /// No VCS tool installed.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_default_path(mut self, path: &str) -> Self {
        self.default_path = Some(path.to_string());
        self
    }

    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = Some(root.to_path_buf());
        self
    }

    pub fn with_status(mut self, lines: &[&str]) -> Self {
        self.status_lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Make the status query fail, as outside a working copy.
    pub fn with_failing_status(mut self) -> Self {
        self.status_fails = true;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

impl VersionControl for MockVcs {
    fn available(&self) -> bool {
        self.available
    }

    fn default_path(&self) -> Option<String> {
        if self.available {
            self.default_path.clone()
        } else {
            None
        }
    }

    fn root(&self) -> Option<PathBuf> {
        if self.available {
            self.root.clone()
        } else {
            None
        }
    }

    fn status(&self) -> Result<Vec<String>, VcsError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(VcsError::Unavailable);
        }
        if self.status_fails {
            return Err(VcsError::CommandFailed {
                command: "status".to_string(),
                stderr: "abort: no repository found".to_string(),
            });
        }
        Ok(self.status_lines.clone())
    }
}
