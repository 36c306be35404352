//! Diagnostic rendering
//!
//! Errors and warnings print as `<file>:<line>:<col>:<severity>:<message>`,
//! the format editors and IDEs pick up. Verbose progress messages print as
//! plain text when they are `info` messages whose topic is not suppressed;
//! all other verbose messages go to the debug log.

use std::io::{self, Write};

use tracing::debug;

use rcc_protocol::{Diagnostic, Severity};

/// Prefix the service puts in front of source file paths.
const SOURCE_PREFIX: &str = "/src/";

/// How a message is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Error,
    Warning,
    /// Sent to the debug log only
    SuppressedVerbose,
    ShownVerbose,
}

/// Suppresses verbose messages of a given type and topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressRule {
    pub kind: String,
    pub topic: String,
}

impl SuppressRule {
    pub fn new(kind: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            topic: topic.into(),
        }
    }

    pub fn matches(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.kind.as_deref() == Some(self.kind.as_str()) && topic(diagnostic) == self.topic
    }
}

/// Text before the first `:` of a message.
pub fn topic(diagnostic: &Diagnostic) -> &str {
    let text = diagnostic.text();
    text.split(':').next().unwrap_or(text).trim()
}

/// Classifies and formats build messages.
#[derive(Debug, Clone)]
pub struct DiagnosticRenderer {
    rules: Vec<SuppressRule>,
}

impl Default for DiagnosticRenderer {
    fn default() -> Self {
        Self {
            // Linker progress is noise on a normal build.
            rules: vec![SuppressRule::new("info", "Link")],
        }
    }
}

impl DiagnosticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer with the given rules instead of the defaults.
    pub fn with_rules(rules: Vec<SuppressRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, diagnostic: &Diagnostic) -> Classification {
        match diagnostic.severity {
            Severity::Error => Classification::Error,
            Severity::Warning => Classification::Warning,
            Severity::Verbose | Severity::Other => {
                let is_info = diagnostic.kind.as_deref() == Some("info");
                if is_info && !self.rules.iter().any(|rule| rule.matches(diagnostic)) {
                    Classification::ShownVerbose
                } else {
                    Classification::SuppressedVerbose
                }
            }
        }
    }

    /// `<file>:<line>:<col>:<severity>:<message>`
    pub fn format_location(&self, diagnostic: &Diagnostic) -> String {
        let file = diagnostic.file.as_deref().unwrap_or("");
        let file = file.strip_prefix(SOURCE_PREFIX).unwrap_or(file);
        format!(
            "{}:{}:{}:{}:{}",
            file,
            diagnostic.line.as_deref().unwrap_or(""),
            diagnostic.col.as_deref().unwrap_or(""),
            diagnostic.severity,
            diagnostic.text()
        )
    }

    /// Display line for a message; `None` when it is suppressed.
    pub fn render(&self, diagnostic: &Diagnostic) -> Option<String> {
        match self.classify(diagnostic) {
            Classification::Error | Classification::Warning => Some(self.format_location(diagnostic)),
            Classification::ShownVerbose => Some(diagnostic.text().to_string()),
            Classification::SuppressedVerbose => {
                debug!(kind = ?diagnostic.kind, severity = %diagnostic.severity, "{}", diagnostic.text());
                None
            }
        }
    }

    /// Write every displayed message of a batch to `out`.
    pub fn render_batch<W: Write>(&self, batch: &[Diagnostic], out: &mut W) -> io::Result<()> {
        for diagnostic in batch {
            if let Some(line) = self.render(diagnostic) {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }

}
