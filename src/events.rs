//! Log lines and the events the console raises for its UI layer.
//!
//! Every outcome the console reports (successful output, warnings, failures)
//! is one `LogEntry`. Producers write to a `LogSink`; the console fans entries
//! out to its listeners.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const LOG_ADDED: &str = "log-added";
pub const LOGS_CLEARED: &str = "logs-cleared";

/// Severity tag of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub kind: LogKind,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, kind: LogKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

/// Destination for console log lines.
pub trait LogSink {
    fn log(&mut self, entry: LogEntry);

    fn info(&mut self, message: &str) {
        self.log(LogEntry::new(message, LogKind::Info));
    }

    fn warn(&mut self, message: &str) {
        self.log(LogEntry::new(message, LogKind::Warning));
    }

    fn error(&mut self, message: &str) {
        self.log(LogEntry::new(message, LogKind::Error));
    }
}

/// Collects entries in memory. Used by the console between dispatch and
/// listener fan-out, and by tests.
#[derive(Debug, Default, Clone)]
pub struct LogBuffer {
    pub entries: Vec<LogEntry>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: LogKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn messages(&self, kind: LogKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.message.as_str())
            .collect()
    }
}

impl LogSink for LogBuffer {
    fn log(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }
}

/// Mirror a console line into `tracing` at the matching level.
pub fn trace_entry(entry: &LogEntry) {
    match entry.kind {
        LogKind::Info => tracing::info!(target: "dev_console::log", "{}", entry.message),
        LogKind::Warning => tracing::warn!(target: "dev_console::log", "{}", entry.message),
        LogKind::Error => tracing::error!(target: "dev_console::log", "{}", entry.message),
    }
}
