//! Configuration overlay
//!
//! Option values come from up to three layers, lowest precedence first:
//! 1. Home config (~/.rcc.toml)
//! 2. Working-directory config (./.rcc.toml)
//! 3. CLI flags
//!
//! Built-in defaults are applied by the option resolver after the VCS and
//! credential-store fallbacks, not as a layer here.

mod defaults;
mod merge;
mod overlay;

pub use defaults::{BuiltinDefaults, CONFIG_FILE_NAME, DEFAULT_REPOSITORY};
pub use merge::{merge_layers, overlay};
pub use overlay::{ConfigError, ConfigOrigin, ConfigSource, OptionLayer, Overlay};
