//! Version Control Integration
//!
//! The working copy's VCS supplies two things: the default repository URL
//! (used when none is configured) and the list of locally changed files
//! whose content should be sent with the build.

use std::path::PathBuf;

mod changeset;
mod mercurial;
mod mock;

pub use changeset::{parse_status_line, ChangeSetCollector, REPLACE_FILE_EXTENSIONS};
pub use mercurial::Mercurial;
pub use mock::MockVcs;

/// VCS errors
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("version control tool is not available")]
    Unavailable,

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability interface over a version-control tool.
pub trait VersionControl {
    /// Whether the tool can be invoked.
    fn available(&self) -> bool;

    /// The default remote path of the working copy, if configured.
    fn default_path(&self) -> Option<String>;

    /// Root directory of the working copy. Status paths are relative to it.
    fn root(&self) -> Option<PathBuf>;

    /// Raw status lines (`<status-code> <path>`) for modified and added
    /// files.
    fn status(&self) -> Result<Vec<String>, VcsError>;
}
