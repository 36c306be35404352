//! Compile Session Tests
//!
//! Submit, poll and download against the in-process mock compile service.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rcc::host::{CompileResult, MockTransport};
use rcc::mock::{Endpoint, FailureConfig};
use rcc::state::SessionState;
use rcc::timeout::PollBudget;
use rcc::{compile, CompileOptions, CompileSession, DiagnosticRenderer, Error, FailureKind, SessionError};
use rcc_protocol::{Diagnostic, Severity};
use tempfile::TempDir;

fn options(dir: &TempDir) -> CompileOptions {
    CompileOptions {
        platform: "K64F".to_string(),
        output_dir: dir.path().to_path_buf(),
        poll_budget: PollBudget {
            max_attempts: 10,
            interval: Duration::ZERO,
        },
        ..CompileOptions::default()
    }
}

// =============================================================================
// Submission
// =============================================================================

#[test]
fn test_replace_map_matches_files() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("main.cpp");
    let header = dir.path().join("util.h");
    let gone = dir.path().join("deleted.c");
    fs::write(&main, "int main() { return 0; }").unwrap();
    fs::write(&header, "#pragma once\n").unwrap();

    let mut opts = options(&dir);
    opts.replace_files = vec![gone.clone(), main.clone(), header.clone()];

    let transport = Arc::new(MockTransport::new());
    let mut session = CompileSession::new(transport.clone());
    session.start(&opts).unwrap();

    let replace = transport.service().submitted_replace().expect("replace field sent");
    let keys: Vec<PathBuf> = replace.paths().map(PathBuf::from).collect();
    let mut expected = opts.replace_files.clone();
    expected.sort();
    assert_eq!(keys, expected, "replace keys should equal replace_files");

    assert_eq!(replace.get(&main.display().to_string()), Some("int main() { return 0; }"));
    assert_eq!(replace.get(&header.display().to_string()), Some("#pragma once\n"));
    assert_eq!(replace.get(&gone.display().to_string()), Some(""), "vanished file is sent empty");
}

#[test]
fn test_start_form_drops_empty_values() {
    let dir = TempDir::new().unwrap();
    let mut opts = options(&dir);
    opts.clean = true;
    opts.extra_symbols = Some("DEBUG=1".to_string());

    let transport = Arc::new(MockTransport::new());
    let mut session = CompileSession::new(transport.clone());
    session.start(&opts).unwrap();

    let start = transport.service().start_request().unwrap();
    assert_eq!(start.method, "POST");
    assert_eq!(start.param("platform"), Some("K64F"));
    assert_eq!(start.param("repo"), Some(opts.repository.as_str()));
    assert_eq!(start.param("clean"), Some("true"));
    assert_eq!(start.param("extra_symbols"), Some("DEBUG=1"));
    assert_eq!(start.param("replace"), None);
}

#[test]
fn test_start_code_500_is_api_error() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.service().inject_failure(Endpoint::Start, FailureConfig::code(500));

    let mut out = Vec::new();
    let err = compile(&options(&dir), transport.clone(), &DiagnosticRenderer::new(), &mut out).unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::Api);
    match err {
        Error::Session(SessionError::Api { body, trace, .. }) => {
            assert!(body.contains("500"));
            assert!(!trace.is_empty());
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(transport.service().request_count(Endpoint::Output), 0, "no poll after failed start");
}

#[test]
fn test_malformed_start_response_is_api_error() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.service().inject_failure(Endpoint::Start, FailureConfig::http(502));

    let mut session = CompileSession::new(transport);
    let err = session.start(&options(&dir)).unwrap_err();
    assert!(matches!(err, SessionError::Api { status: 502, .. }));
    assert_eq!(session.task_id(), None);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_rejected_credentials() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.service().reject_credentials();

    let mut out = Vec::new();
    let err = compile(&options(&dir), transport, &DiagnosticRenderer::new(), &mut out).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

// =============================================================================
// Polling
// =============================================================================

#[test]
fn test_compile_failure() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    transport
        .service()
        .push_batch(vec![Diagnostic::new(Severity::Verbose, "Compile: main.cpp").with_kind("info")]);
    transport.service().push_final_batch(vec![
        Diagnostic::new(Severity::Warning, "unused variable 'x'").at("/src/main.cpp", 4, 9),
        Diagnostic::new(Severity::Error, "expected ';'").at("/src/main.cpp", 7, 14),
    ]);

    let mut session = CompileSession::new(transport.clone());
    let opts = options(&dir);
    session.start(&opts).unwrap();

    let err = opts.poll_budget.drive(&mut session, |_| {}).unwrap_err();
    let err = Error::from(err);
    assert_eq!(err.exit_code(), 5);
    match err {
        Error::Session(SessionError::CompileFailure { trigger, diagnostics }) => {
            assert_eq!(trigger.text(), "expected ';'");
            assert_eq!(diagnostics.len(), 3);
        }
        other => panic!("expected compile failure, got {:?}", other),
    }

    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.messages().len(), 2, "final batch stays available");
    assert!(matches!(session.result(), Some(CompileResult::Failed { .. })));

    // Terminal: no further polls, no download.
    assert_eq!(session.poll().unwrap(), SessionState::Failed);
    assert!(matches!(
        session.download(dir.path()),
        Err(SessionError::NotSucceeded { state: SessionState::Failed })
    ));
    assert_eq!(transport.service().request_count(Endpoint::Output), 2);
    assert_eq!(transport.service().request_count(Endpoint::Bin), 0);
}

#[test]
fn test_polls_reference_submitted_task() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.service().set_task_id("task-xyz");
    transport.service().push_batch(vec![]);
    transport.service().push_final_batch(vec![]);

    let mut out = Vec::new();
    compile(&options(&dir), transport.clone(), &DiagnosticRenderer::new(), &mut out).unwrap();

    for request in transport.service().requests() {
        match Endpoint::from_path(&request.path) {
            Some(Endpoint::Output) => assert_eq!(request.path, "output/task-xyz"),
            Some(Endpoint::Bin) => assert_eq!(request.param("task_id"), Some("task-xyz")),
            _ => {}
        }
    }
}

#[test]
fn test_poll_budget_exhausted() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    let mut opts = options(&dir);
    opts.poll_budget.max_attempts = 3;

    let mut out = Vec::new();
    let err = compile(&opts, transport.clone(), &DiagnosticRenderer::new(), &mut out).unwrap_err();
    assert!(matches!(err, Error::PollTimeout { attempts: 3 }));
    assert_eq!(err.exit_code(), 6);
    assert_eq!(transport.service().request_count(Endpoint::Output), 3);
}

// =============================================================================
// Download
// =============================================================================

#[test]
fn test_download_writes_binary() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.service().set_artifact("blinky", "app.bin", vec![0xA5; 12345]);
    transport.service().push_final_batch(vec![]);

    let mut out = Vec::new();
    let artifact = compile(&options(&dir), transport.clone(), &DiagnosticRenderer::new(), &mut out).unwrap();

    assert_eq!(artifact.path, dir.path().join("app.bin"));
    assert_eq!(artifact.size, 12345);
    assert_eq!(fs::metadata(&artifact.path).unwrap().len(), 12345);

    let bin = transport
        .service()
        .requests()
        .into_iter()
        .find(|r| r.path == "bin/")
        .unwrap();
    assert_eq!(bin.param("repomode"), Some("True"));
    assert_eq!(bin.param("program"), Some("blinky"));
    assert_eq!(bin.param("binary"), Some("app.bin"));
}

#[test]
fn test_download_before_success_rejected() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    let mut session = CompileSession::new(transport.clone());
    session.start(&options(&dir)).unwrap();

    let err = session.download(dir.path()).unwrap_err();
    assert!(matches!(err, SessionError::NotSucceeded { state: SessionState::Submitted }));
    assert_eq!(transport.service().request_count(Endpoint::Bin), 0);
}

#[test]
fn test_download_failure_is_api_error() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.service().push_final_batch(vec![]);
    transport.service().inject_failure(Endpoint::Bin, FailureConfig::http(500));

    let mut out = Vec::new();
    let err = compile(&options(&dir), transport, &DiagnosticRenderer::new(), &mut out).unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::Api);
    assert!(!dir.path().join("blinky.bin").exists());
}
