//! Append-only log of build-time configuration errors.
//!
//! The [`ErrorLog`] is owned by a [`PluginGraph`](crate::PluginGraph) and
//! threaded through every graph-building call.  Entries are never mutated or
//! removed; a build pass keeps going after recording an entry so that every
//! problem in a configuration surfaces at once.

use std::fmt;

use tracing::warn;

use crate::error::ErrorCode;

/// One recorded configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    code: ErrorCode,
    message: String,
    context: Option<String>,
}

impl LogEntry {
    /// Stable numeric code of the entry.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The type reference or configuration fragment implicated, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}: {}", self.code, self.message)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

/// Ordered, append-only collection of [`LogEntry`] records.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Vec<LogEntry>,
}

impl ErrorLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.  Every append is also traced at `WARN`.
    pub fn record(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        context: Option<String>,
    ) {
        let entry = LogEntry {
            code,
            message: message.into(),
            context,
        };
        warn!(
            code    = code.as_u16(),
            context = entry.context.as_deref().unwrap_or(""),
            "{}",
            entry.message
        );
        self.entries.push(entry);
    }

    /// Number of recorded entries.
    pub fn error_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if at least one entry carries `code`.
    pub fn has_error(&self, code: impl Into<u16>) -> bool {
        let code = code.into();
        self.entries.iter().any(|e| e.code.as_u16() == code)
    }

    /// Entries in recording order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Multi-line report of every entry, suitable for start-up diagnostics.
    pub fn report(&self) -> String {
        let mut out = format!("{} configuration error(s)", self.entries.len());
        for entry in &self.entries {
            out.push_str("\n  ");
            out.push_str(&entry.to_string());
        }
        out
    }
}
