//! RCC Protocol Types
//!
//! Defines the JSON envelope and payloads of the online compiler task API.
//! Every JSON response has the shape `{code, result: {data}}`; the binary
//! download endpoint returns raw bytes.

pub mod diagnostic;
pub mod envelope;
pub mod error;
pub mod ops;

pub use diagnostic::{Diagnostic, Severity};
pub use envelope::{decode, ApiEnvelope};
pub use error::ProtocolError;
pub use ops::{BinQuery, OutputData, ReplaceMap, StartData, StartRequest};

/// Default API endpoint of the online compiler.
pub const DEFAULT_ENDPOINT: &str = "http://developer.mbed.org/api/v2/tasks/compiler/";

/// Envelope code signalling success.
pub const SUCCESS_CODE: i64 = 200;

/// Endpoint paths, relative to the API endpoint.
pub mod paths {
    pub const START: &str = "start/";
    pub const OUTPUT: &str = "output/";
    pub const BIN: &str = "bin/";

    /// Path of the output endpoint for one task.
    pub fn output(task_id: &str) -> String {
        format!("{}{}", OUTPUT, task_id)
    }
}
