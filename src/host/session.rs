//! Compile Session
//!
//! Drives one compile-poll-download cycle against the task API:
//! submit the build, poll for new messages until the task completes,
//! then fetch the binary. The poll loop itself belongs to the caller
//! (see [`PollBudget`](crate::timeout::PollBudget)).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use rcc_protocol::{decode, paths, BinQuery, Diagnostic, OutputData, ProtocolError, ReplaceMap, StartData, StartRequest};

use super::trace::RequestTrace;
use super::transport::{HttpResponse, Transport, TransportError};
use crate::options::CompileOptions;
use crate::state::{SessionState, SessionStateError, TerminalState};

/// The task accepted by the service. Set once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub task_id: String,
}

/// Outcome of a completed task
#[derive(Debug, Clone, PartialEq)]
pub enum CompileResult {
    Succeeded {
        program: Option<String>,
        binary: Option<String>,
    },
    Failed {
        /// First error of the final batch
        trigger: Diagnostic,
        /// Every message received during the session
        diagnostics: Vec<Diagnostic>,
    },
}

/// A downloaded binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

/// A local file sent for server-side substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOverride {
    pub path: PathBuf,
    pub content: String,
}

impl FileOverride {
    /// Read the file now. A path that is no longer a file is sent empty.
    /// Content must be UTF-8; it is never altered on the way out.
    pub fn read(path: &Path) -> Result<Self, SessionError> {
        let content = if path.is_file() {
            String::from_utf8(fs::read(path)?).map_err(|_| SessionError::NonUtf8Override {
                path: path.to_path_buf(),
            })?
        } else {
            debug!(path = %path.display(), "override no longer exists, sending empty content");
            String::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }
}

/// Compile session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Authentication failed: the service rejected the credentials")]
    Auth { trace: RequestTrace },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: u16,
        body: String,
        trace: RequestTrace,
    },

    #[error("Compile failed: {}", .trigger.text())]
    CompileFailure {
        trigger: Diagnostic,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("No task submitted - call start() first")]
    NotSubmitted,

    #[error("Session already started")]
    AlreadyStarted,

    #[error("No artifact to download: session is {state}")]
    NotSucceeded { state: SessionState },

    #[error("Completed task did not name a downloadable binary")]
    MissingArtifact,

    #[error("Cannot send {}: content is not valid UTF-8", .path.display())]
    NonUtf8Override { path: PathBuf },

    #[error("Invalid state transition: {0}")]
    State(#[from] SessionStateError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transport error: {source}")]
    Transport {
        #[source]
        source: TransportError,
        trace: RequestTrace,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Request trace attached to auth, API and transport errors.
    pub fn trace(&self) -> Option<&RequestTrace> {
        match self {
            SessionError::Auth { trace }
            | SessionError::Api { trace, .. }
            | SessionError::Transport { trace, .. } => Some(trace),
            _ => None,
        }
    }
}

/// One compile-poll-download cycle
pub struct CompileSession {
    transport: Arc<dyn Transport>,
    state: SessionState,
    submission: Option<Submission>,
    /// Messages of the most recent poll
    batch: Vec<Diagnostic>,
    /// Messages of every poll so far
    history: Vec<Diagnostic>,
    result: Option<CompileResult>,
}

impl CompileSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: SessionState::Idle,
            submission: None,
            batch: Vec::new(),
            history: Vec::new(),
            result: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn task_id(&self) -> Option<&str> {
        self.submission.as_ref().map(|s| s.task_id.as_str())
    }

    /// Messages of the most recent poll.
    pub fn messages(&self) -> &[Diagnostic] {
        &self.batch
    }

    /// All messages received so far.
    pub fn history(&self) -> &[Diagnostic] {
        &self.history
    }

    pub fn result(&self) -> Option<&CompileResult> {
        self.result.as_ref()
    }

    /// Submit the build.
    pub fn start(&mut self, options: &CompileOptions) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }

        let replace = if options.replace_files.is_empty() {
            None
        } else {
            let mut map = ReplaceMap::new();
            for path in &options.replace_files {
                let file = FileOverride::read(path)?;
                map.insert(file.path.display().to_string(), file.content);
            }
            Some(map)
        };

        let request = StartRequest {
            platform: options.platform.clone(),
            repo: options.repository.clone(),
            clean: options.clean,
            extra_symbols: options.extra_symbols.clone(),
            replace,
        };
        let form = request.to_form()?;

        info!(platform = %options.platform, repo = %options.repository, overrides = options.replace_files.len(), "submitting build");
        let response = self
            .transport
            .post_form(paths::START, &form)
            .map_err(|e| self.transport_error(e))?;
        let data: StartData = self.decode_response(&response)?;

        let next = self.state.transition(SessionState::Submitted)?;
        info!(task_id = %data.task_id, "build accepted");
        self.submission = Some(Submission { task_id: data.task_id });
        self.state = next;
        Ok(())
    }

    /// Fetch new messages. Once terminal, returns the state without any
    /// network call.
    pub fn poll(&mut self) -> Result<SessionState, SessionError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        let task_id = match self.submission {
            Some(ref submission) => submission.task_id.clone(),
            None => return Err(SessionError::NotSubmitted),
        };

        let response = self
            .transport
            .get(&paths::output(&task_id), &[])
            .map_err(|e| self.transport_error(e))?;
        let data: OutputData = self.decode_response(&response)?;
        debug!(task_id = %task_id, complete = data.task_complete, messages = data.new_messages.len(), "poll");

        self.history.extend(data.new_messages.iter().cloned());
        self.batch = data.new_messages.clone();

        if !data.task_complete {
            self.state = self.state.transition(SessionState::Polling)?;
            return Ok(self.state);
        }

        if let Some(trigger) = data.first_error().cloned() {
            self.state = self.state.transition(SessionState::Failed)?;
            info!(task_id = %task_id, "build failed");
            let diagnostics = self.history.clone();
            self.result = Some(CompileResult::Failed {
                trigger: trigger.clone(),
                diagnostics: diagnostics.clone(),
            });
            return Err(SessionError::CompileFailure { trigger, diagnostics });
        }

        self.state = self.state.transition(SessionState::Succeeded)?;
        info!(task_id = %task_id, binary = ?data.binary, "build succeeded");
        self.result = Some(CompileResult::Succeeded {
            program: data.program,
            binary: data.binary,
        });
        Ok(self.state)
    }

    /// Write the binary into `output_dir`. Only valid after success.
    pub fn download(&self, output_dir: &Path) -> Result<Artifact, SessionError> {
        let (program, binary) = match self.result {
            Some(CompileResult::Succeeded {
                program: Some(ref program),
                binary: Some(ref binary),
            }) => (program, binary),
            Some(CompileResult::Succeeded { .. }) => return Err(SessionError::MissingArtifact),
            _ => return Err(SessionError::NotSucceeded { state: self.state }),
        };
        let task_id = self.task_id().ok_or(SessionError::NotSubmitted)?;

        // Only the final component; the name comes from the service.
        let file_name = Path::new(binary)
            .file_name()
            .ok_or(SessionError::MissingArtifact)?;

        let query = BinQuery {
            program: program.clone(),
            binary: binary.clone(),
            task_id: task_id.to_string(),
        };
        let response = self
            .transport
            .get(paths::BIN, &query.to_query())
            .map_err(|e| self.transport_error(e))?;
        self.check_status(&response)?;

        let path = output_dir.join(file_name);
        fs::write(&path, &response.body)?;
        let size = response.body.len() as u64;
        info!(path = %path.display(), size, "binary downloaded");

        Ok(Artifact { path, size })
    }

    fn check_status(&self, response: &HttpResponse) -> Result<(), SessionError> {
        if response.is_auth_rejection() {
            return Err(SessionError::Auth {
                trace: self.transport.trace(),
            });
        }
        if !response.is_success() {
            return Err(self.api_error(format!("HTTP status {}", response.status), response));
        }
        Ok(())
    }

    fn decode_response<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T, SessionError> {
        self.check_status(response)?;
        decode(&response.body).map_err(|e| self.api_error(e.to_string(), response))
    }

    fn transport_error(&self, source: TransportError) -> SessionError {
        SessionError::Transport {
            source,
            trace: self.transport.trace(),
        }
    }

    fn api_error(&self, message: String, response: &HttpResponse) -> SessionError {
        SessionError::Api {
            message,
            status: response.status,
            body: response.body_text(),
            trace: self.transport.trace(),
        }
    }
}
