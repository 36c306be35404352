//! Mock compile service
//!
//! Configurable stand-in for the task API, driven through
//! [`MockTransport`](crate::host::MockTransport).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::json;

use rcc_protocol::ops::fields;
use rcc_protocol::{paths, ApiEnvelope, Diagnostic, OutputData, ReplaceMap, StartData};

use super::failure::{Endpoint, FailureConfig, FailureInjector};
use crate::host::HttpResponse;

/// A request as seen by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a form or query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
struct ServiceState {
    requests: Vec<RecordedRequest>,
    assign_task_id: String,
    task_id: Option<String>,
    batches: VecDeque<OutputData>,
    program: String,
    binary: String,
    artifact: Vec<u8>,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            assign_task_id: "task-0001".to_string(),
            task_id: None,
            batches: VecDeque::new(),
            program: "blinky".to_string(),
            binary: "blinky.bin".to_string(),
            artifact: Vec::new(),
        }
    }
}

/// Configurable mock compile service for testing
#[derive(Debug, Default)]
pub struct MockCompileService {
    /// Mutable state (wrapped for interior mutability)
    state: Arc<Mutex<ServiceState>>,
    /// Failure injector
    failures: Arc<Mutex<FailureInjector>>,
}

impl MockCompileService {
    /// Create a new mock service. Without scripted batches every poll
    /// reports the task as still running.
    pub fn new() -> Self {
        Self::default()
    }

    // === Public API for test configuration ===

    /// Task id handed out by the next start request
    pub fn set_task_id(&self, task_id: &str) {
        self.state.lock().unwrap().assign_task_id = task_id.to_string();
    }

    /// Queue a batch for a poll that finds the task still running
    pub fn push_batch(&self, messages: Vec<Diagnostic>) {
        self.state.lock().unwrap().batches.push_back(OutputData {
            task_complete: false,
            new_messages: messages,
            program: None,
            binary: None,
        });
    }

    /// Queue the batch of the poll that finds the task complete
    pub fn push_final_batch(&self, messages: Vec<Diagnostic>) {
        let mut state = self.state.lock().unwrap();
        let data = OutputData {
            task_complete: true,
            new_messages: messages,
            program: Some(state.program.clone()),
            binary: Some(state.binary.clone()),
        };
        state.batches.push_back(data);
    }

    /// Binary served by `bin/`. Call before queueing the final batch.
    pub fn set_artifact(&self, program: &str, binary: &str, content: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.program = program.to_string();
        state.binary = binary.to_string();
        state.artifact = content;
    }

    /// Inject a failure for an endpoint
    pub fn inject_failure(&self, endpoint: Endpoint, config: FailureConfig) {
        self.failures.lock().unwrap().set(endpoint, config);
    }

    /// Reject credentials on every endpoint
    pub fn reject_credentials(&self) {
        self.failures.lock().unwrap().set_all(FailureConfig::unauthorized());
    }

    // === Inspection ===

    /// All requests received, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests received for an endpoint
    pub fn request_count(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| Endpoint::from_path(&r.path) == Some(endpoint))
            .count()
    }

    /// Form of the first start request
    pub fn start_request(&self) -> Option<RecordedRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| Endpoint::from_path(&r.path) == Some(Endpoint::Start))
            .cloned()
    }

    /// Decoded `replace` field of the first start request
    pub fn submitted_replace(&self) -> Option<ReplaceMap> {
        let request = self.start_request()?;
        let encoded = request.param(fields::REPLACE)?;
        ReplaceMap::decode(encoded).ok()
    }

    // === Request handling ===

    /// Handle a request
    pub fn handle(&self, method: &str, path: &str, params: &[(String, String)]) -> HttpResponse {
        self.state.lock().unwrap().requests.push(RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            params: params.to_vec(),
        });

        let Some(endpoint) = Endpoint::from_path(path) else {
            return error_response(404, 404, "no such endpoint");
        };

        if let Some(failure) = self.failures.lock().unwrap().check(endpoint) {
            return failure_response(&failure);
        }

        match (method, endpoint) {
            ("POST", Endpoint::Start) => self.handle_start(),
            ("GET", Endpoint::Output) => self.handle_output(path),
            ("GET", Endpoint::Bin) => self.handle_bin(params),
            _ => error_response(405, 405, "method not allowed"),
        }
    }

    fn handle_start(&self) -> HttpResponse {
        let mut state = self.state.lock().unwrap();
        let task_id = state.assign_task_id.clone();
        state.task_id = Some(task_id.clone());
        json_response(&ApiEnvelope::ok(StartData { task_id }))
    }

    fn handle_output(&self, path: &str) -> HttpResponse {
        let mut state = self.state.lock().unwrap();
        let requested = path.strip_prefix(paths::OUTPUT).unwrap_or_default();
        if state.task_id.as_deref() != Some(requested) {
            return error_response(200, 404, "unknown task");
        }

        let data = state.batches.pop_front().unwrap_or_default();
        json_response(&ApiEnvelope::ok(data))
    }

    fn handle_bin(&self, params: &[(String, String)]) -> HttpResponse {
        let state = self.state.lock().unwrap();
        let param = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

        let matches = state.task_id.is_some()
            && param(fields::TASK_ID) == state.task_id.as_deref()
            && param(fields::BINARY) == Some(state.binary.as_str())
            && param(fields::PROGRAM) == Some(state.program.as_str())
            && param(fields::REPOMODE) == Some("True");

        if !matches {
            return HttpResponse::new(404, "not found");
        }
        HttpResponse::new(200, state.artifact.clone())
    }
}

fn json_response<T: serde::Serialize>(value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => HttpResponse::new(200, body),
        Err(e) => HttpResponse::new(500, e.to_string()),
    }
}

fn error_response(http_status: u16, code: i64, message: &str) -> HttpResponse {
    let body = json!({"code": code, "errors": [message]});
    HttpResponse::new(http_status, body.to_string())
}

fn failure_response(failure: &FailureConfig) -> HttpResponse {
    match failure.envelope_code {
        Some(code) => error_response(failure.http_status, code, "injected failure"),
        None => HttpResponse::new(failure.http_status, "injected failure"),
    }
}
