//! Mercurial backend.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::{VcsError, VersionControl};

/// Runs `hg` in a working directory.
#[derive(Debug, Clone)]
pub struct Mercurial {
    program: String,
    cwd: PathBuf,
    available: bool,
}

impl Mercurial {
    /// Detect `hg` on `PATH` for the working copy at `cwd`.
    pub fn detect(cwd: impl Into<PathBuf>) -> Self {
        Self::detect_program("hg", cwd)
    }

    pub fn detect_program(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let available = match Command::new(&program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(program = %program, error = %e, "vcs check failed");
                false
            }
        };
        debug!(program = %program, available, "detected version control");

        Self {
            program,
            cwd: cwd.into(),
            available,
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        if !self.available {
            return Err(VcsError::Unavailable);
        }

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for Mercurial {
    fn available(&self) -> bool {
        self.available
    }

    fn default_path(&self) -> Option<String> {
        match self.run(&["config", "paths.default"]) {
            Ok(out) => {
                let path = out.trim();
                (!path.is_empty()).then(|| path.to_string())
            }
            Err(e) => {
                debug!(error = %e, "no default path");
                None
            }
        }
    }

    fn root(&self) -> Option<PathBuf> {
        match self.run(&["root"]) {
            Ok(out) => {
                let root = out.trim();
                (!root.is_empty()).then(|| PathBuf::from(root))
            }
            Err(e) => {
                debug!(error = %e, "no working copy root");
                None
            }
        }
    }

    fn status(&self) -> Result<Vec<String>, VcsError> {
        // Renames and copies are reported as added.
        let out = self.run(&["status", "--modified", "--added"])?;
        Ok(out.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use std::fs;
    #[cfg(unix)]
    use tempfile::TempDir;

    /// Stand-in `hg` answering the queries the backend makes.
    #[cfg(unix)]
    fn fake_hg(dir: &TempDir) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("hg");
        fs::write(
            &path,
            "#!/bin/sh\n\
             case \"$1\" in\n\
             config) printf 'https://x\\n' ;;\n\
             root) printf '/work/prog\\n' ;;\n\
             status) printf 'M main.cpp\\nA lib/my file.h\\n' ;;\n\
             esac\n",
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_queries_are_trimmed() {
        let dir = TempDir::new().unwrap();
        let program = fake_hg(&dir);
        let hg = Mercurial::detect_program(program.to_string_lossy(), dir.path());

        assert!(hg.available());
        assert_eq!(hg.default_path().as_deref(), Some("https://x"));
        assert_eq!(hg.root(), Some(PathBuf::from("/work/prog")));
        assert_eq!(hg.status().unwrap(), vec!["M main.cpp", "A lib/my file.h"]);
    }

    #[test]
    fn test_missing_executable() {
        let hg = Mercurial::detect_program("rcc-test-no-such-hg-binary", ".");
        assert!(!hg.available());
        assert!(hg.default_path().is_none());
        assert!(hg.root().is_none());
        assert!(matches!(hg.status(), Err(VcsError::Unavailable)));
    }
}
