//! Overlay files with provenance
//!
//! An overlay file is static TOML holding any subset of the compile
//! options. Loaded files are recorded with their path and the SHA-256
//! digest of their raw bytes so `rcc config` can show where values came
//! from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::defaults::CONFIG_FILE_NAME;
use super::merge::merge_layers;
use crate::credentials::Secret;

/// One layer of option values. Every field is optional; absent fields fall
/// through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionLayer {
    #[serde(default, alias = "repo", skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_files: Option<Vec<PathBuf>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_symbols: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_seconds: Option<u64>,
}

impl OptionLayer {
    /// Parse a layer from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))
    }

    /// Make relative paths relative to `dir`.
    fn anchor(mut self, dir: &Path) -> Self {
        if let Some(ref out) = self.output_dir {
            if out.is_relative() {
                self.output_dir = Some(dir.join(out));
            }
        }
        if let Some(ref files) = self.replace_files {
            self.replace_files = Some(
                files
                    .iter()
                    .map(|f| if f.is_relative() { dir.join(f) } else { f.clone() })
                    .collect(),
            );
        }
        self
    }

    /// Render as TOML. Passwords are redacted.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Origin of a configuration source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Home,
    Cwd,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    pub path: PathBuf,

    /// SHA-256 digest of raw file bytes
    pub digest: String,
}

/// Merged overlay from the home and working-directory files.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub options: OptionLayer,
    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl Overlay {
    /// Load `~/.rcc.toml` then `./.rcc.toml`; missing files are skipped.
    pub fn load(home: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        let mut candidates = Vec::new();
        if let Some(home) = home {
            candidates.push((ConfigOrigin::Home, home.join(CONFIG_FILE_NAME)));
        }
        let cwd_file = cwd.join(CONFIG_FILE_NAME);
        if !candidates.iter().any(|(_, p)| *p == cwd_file) {
            candidates.push((ConfigOrigin::Cwd, cwd_file));
        }

        let mut layers = Vec::new();
        let mut sources = Vec::new();

        for (origin, path) in candidates {
            if !path.is_file() {
                debug!(path = %path.display(), "config not found");
                continue;
            }

            let (layer, digest) = Self::load_file(&path)?;
            debug!(path = %path.display(), digest = %digest, "config loaded");

            let dir = path.parent().unwrap_or(cwd);
            layers.push(layer.anchor(dir));
            sources.push(ConfigSource {
                origin,
                path,
                digest,
            });
        }

        Ok(Self {
            options: merge_layers(layers),
            sources,
        })
    }

    /// Load and parse one file, returning the layer and digest
    fn load_file(path: &Path) -> Result<(OptionLayer, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes).map_err(|e| {
            ConfigError::ParseError(format!("{}: invalid UTF-8: {}", path.display(), e))
        })?;

        let layer = OptionLayer::from_toml(&contents).map_err(|e| match e {
            ConfigError::ParseError(msg) => {
                ConfigError::ParseError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        Ok((layer, digest))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
