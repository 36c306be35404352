//! Mock Compile Service
//!
//! Implements an in-process stand-in for the online compiler task API,
//! with failure injection for testing error paths.
//!
//! # Endpoints
//!
//! - `start/`: accept a build, record the form, assign a task id
//! - `output/<task_id>`: hand out scripted message batches in order
//! - `bin/`: return the configured binary for the completed task

mod failure;
mod service;

pub use failure::{Endpoint, FailureConfig, FailureInjector};
pub use service::{MockCompileService, RecordedRequest};
