//! Operation-specific types.

pub mod bin;
pub mod output;
pub mod start;

pub use bin::BinQuery;
pub use output::OutputData;
pub use start::{ReplaceMap, StartData, StartRequest};

/// Form and query field names.
pub mod fields {
    pub const PLATFORM: &str = "platform";
    pub const REPO: &str = "repo";
    pub const CLEAN: &str = "clean";
    pub const EXTRA_SYMBOLS: &str = "extra_symbols";
    pub const REPLACE: &str = "replace";
    pub const REPOMODE: &str = "repomode";
    pub const PROGRAM: &str = "program";
    pub const BINARY: &str = "binary";
    pub const TASK_ID: &str = "task_id";
}
