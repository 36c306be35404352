//! Build diagnostics reported by the compile service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity of a build message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Verbose,
    /// Any severity this client does not know about.
    #[default]
    #[serde(other)]
    Other,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Verbose => "verbose",
            Severity::Other => "other",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message from the `new_messages` list of an output response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub severity: Severity,

    /// Message type, e.g. `info` for verbose progress notices.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Line number. The service sends numbers or strings.
    #[serde(default, deserialize_with = "number_or_string", skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,

    #[serde(default, deserialize_with = "number_or_string", skip_serializing_if = "Option::is_none")]
    pub col: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the given severity and text.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Attach a source location.
    pub fn at(mut self, file: impl Into<String>, line: u64, col: u64) -> Self {
        self.file = Some(file.into());
        self.line = Some(line.to_string());
        self.col = Some(col.to_string());
        self
    }

    /// Set the message type.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Message text, empty when the service omitted it.
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_error_message() {
        let d: Diagnostic = serde_json::from_value(json!({
            "severity": "error",
            "file": "/src/main.cpp",
            "line": 12,
            "col": "5",
            "message": "expected ';'"
        }))
        .unwrap();

        assert!(d.is_error());
        assert_eq!(d.line.as_deref(), Some("12"));
        assert_eq!(d.col.as_deref(), Some("5"));
        assert_eq!(d.text(), "expected ';'");
    }

    #[test]
    fn test_parse_verbose_with_type() {
        let d: Diagnostic = serde_json::from_value(json!({
            "severity": "verbose",
            "type": "info",
            "message": "Compile: main.cpp"
        }))
        .unwrap();

        assert_eq!(d.severity, Severity::Verbose);
        assert_eq!(d.kind.as_deref(), Some("info"));
        assert!(d.file.is_none());
    }

    #[test]
    fn test_unknown_severity_is_other() {
        let d: Diagnostic = serde_json::from_value(json!({"severity": "fatal"})).unwrap();
        assert_eq!(d.severity, Severity::Other);

        let d: Diagnostic = serde_json::from_value(json!({"message": "no severity"})).unwrap();
        assert_eq!(d.severity, Severity::Other);
    }
}
