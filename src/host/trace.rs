//! Request trace
//!
//! Every request and response a transport makes is recorded here. The
//! trace is attached to auth, API and transport errors so the CLI can
//! show what was exchanged with the service.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Mutex;

/// Longest response body excerpt kept per entry.
const MAX_BODY_EXCERPT: usize = 2048;

/// One recorded line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub at: DateTime<Utc>,
    pub line: String,
}

/// Snapshot of recorded entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTrace {
    pub entries: Vec<TraceEntry>,
}

impl RequestTrace {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for RequestTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {}", entry.at.to_rfc3339(), entry.line)?;
        }
        Ok(())
    }
}

/// Append-only recorder shared by a transport's requests.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    entries: Mutex<Vec<TraceEntry>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, line: impl Into<String>) {
        let entry = TraceEntry {
            at: Utc::now(),
            line: line.into(),
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    /// Record a response status and a bounded excerpt of its body.
    pub fn record_response(&self, status: u16, body: &[u8]) {
        let text = String::from_utf8_lossy(body);
        let excerpt: String = text.chars().take(MAX_BODY_EXCERPT).collect();
        let ellipsis = if text.chars().count() > MAX_BODY_EXCERPT { "..." } else { "" };
        self.record(format!("<- {} ({} bytes) {}{}", status, body.len(), excerpt, ellipsis));
    }

    pub fn snapshot(&self) -> RequestTrace {
        let entries = self
            .entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default();
        RequestTrace { entries }
    }
}
