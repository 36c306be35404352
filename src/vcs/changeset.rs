//! Change-set collection
//!
//! Determines which local files replace their repository versions in a
//! build: VCS-reported changes with an allow-listed extension, plus any
//! explicitly named files. The result is deduplicated and sorted so that
//! collecting twice on an unchanged working copy gives the same list.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::VersionControl;

/// Extensions of files that are sent when modified: sources, headers and
/// the build-description files of an mbed program.
pub const REPLACE_FILE_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx", "s", "S", "inc", "lib", "json",
];

/// Split a status line into its status code and path.
///
/// Paths may contain spaces, so everything after the first token is the
/// path (re-joined with single spaces).
pub fn parse_status_line(line: &str) -> Option<(&str, String)> {
    let mut tokens = line.split_whitespace();
    let code = tokens.next()?;
    let path = tokens.collect::<Vec<_>>().join(" ");
    if path.is_empty() {
        return None;
    }
    Some((code, path))
}

/// Collects the replace-file list from a VCS.
pub struct ChangeSetCollector<'a> {
    vcs: &'a dyn VersionControl,
    extensions: &'a [&'a str],
}

impl<'a> ChangeSetCollector<'a> {
    pub fn new(vcs: &'a dyn VersionControl) -> Self {
        Self {
            vcs,
            extensions: REPLACE_FILE_EXTENSIONS,
        }
    }

    /// Use a different extension allow-list.
    pub fn with_extensions(mut self, extensions: &'a [&'a str]) -> Self {
        self.extensions = extensions;
        self
    }

    fn allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// VCS-reported changes passing the extension filter.
    fn changed_files(&self) -> Vec<PathBuf> {
        if !self.vcs.available() {
            debug!("version control unavailable; no changed files collected");
            return Vec::new();
        }

        let lines = match self.vcs.status() {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "could not query changed files");
                return Vec::new();
            }
        };

        // Status paths are relative to the working-copy root, not the cwd.
        let root = self.vcs.root();
        lines
            .iter()
            .filter_map(|line| parse_status_line(line))
            .map(|(_, path)| match root {
                Some(ref root) => root.join(path),
                None => PathBuf::from(path),
            })
            .filter(|path| self.allowed(path))
            .collect()
    }

    /// Changed files merged with `explicit` overrides, deduplicated and
    /// sorted. Explicit paths bypass the extension filter.
    pub fn collect(&self, explicit: &[PathBuf]) -> Vec<PathBuf> {
        let files: BTreeSet<PathBuf> = self
            .changed_files()
            .into_iter()
            .chain(explicit.iter().cloned())
            .collect();

        let files: Vec<PathBuf> = files.into_iter().collect();
        debug!(count = files.len(), files = ?files, "collected replace files");
        files
    }
}
