//! RCC - Remote Compile Client
//!
//! Builds an mbed program on the online compiler: locally modified sources
//! are sent along with the build request, the build is polled until it
//! finishes, its messages are shown in an editor-friendly format and the
//! resulting binary is downloaded.

pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod mock;
pub mod options;
pub mod pipeline;
pub mod render;
pub mod state;
pub mod timeout;
pub mod vcs;

pub use error::{Error, FailureKind, Result};
pub use host::{CompileSession, SessionError};
pub use options::{CompileOptions, Environment, ExplicitOptions, OptionResolver};
pub use pipeline::compile;
pub use render::DiagnosticRenderer;
