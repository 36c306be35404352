//! Client-Side Components
//!
//! Talks to the compile service: the HTTP transport seam, the request
//! trace and the compile session built on top of them.

pub mod session;
pub mod trace;
pub mod transport;

pub use session::{Artifact, CompileResult, CompileSession, FileOverride, SessionError, Submission};
pub use trace::{RequestTrace, TraceEntry, TraceRecorder};
pub use transport::{HttpConfig, HttpResponse, HttpTransport, MockTransport, Transport, TransportError};
