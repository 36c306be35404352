//! Output operation types.
//!
//! Polling a task: each response carries the messages produced since the
//! previous poll, and once `task_complete` is set, the names needed to
//! download the binary.

use serde::{Deserialize, Serialize};

use crate::diagnostic::{Diagnostic, Severity};

/// `result.data` of an output response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputData {
    /// Whether the build has finished (successfully or not).
    #[serde(default)]
    pub task_complete: bool,

    /// Messages produced since the previous poll.
    #[serde(default)]
    pub new_messages: Vec<Diagnostic>,

    /// Program name, present once complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Binary file name, present once complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
}

impl OutputData {
    /// First error-severity message of this batch.
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.new_messages.iter().find(|m| m.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_in_progress() {
        let data: OutputData = serde_json::from_value(json!({
            "task_complete": false,
            "new_messages": [{"severity": "verbose", "type": "info", "message": "Compile: a.cpp"}]
        }))
        .unwrap();

        assert!(!data.task_complete);
        assert_eq!(data.new_messages.len(), 1);
        assert!(data.first_error().is_none());
        assert!(data.binary.is_none());
    }

    #[test]
    fn test_parse_complete_with_error() {
        let data: OutputData = serde_json::from_value(json!({
            "task_complete": true,
            "new_messages": [
                {"severity": "warning", "message": "unused"},
                {"severity": "error", "message": "boom"}
            ],
            "program": "blinky",
            "binary": "blinky_K64F.bin"
        }))
        .unwrap();

        assert!(data.task_complete);
        assert_eq!(data.first_error().map(|d| d.text()), Some("boom"));
        assert_eq!(data.binary.as_deref(), Some("blinky_K64F.bin"));
    }

    #[test]
    fn test_missing_messages_default_empty() {
        let data: OutputData = serde_json::from_value(json!({"task_complete": true})).unwrap();
        assert!(data.new_messages.is_empty());
    }
}
