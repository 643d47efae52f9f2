use serde::Serialize;
use thiserror::Error;

/// Structured error type for the console. Every failure below the console
/// boundary is one of these and ends up as a single log line.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Unknown command: '{name}'")]
    UnknownCommand { name: String },
    #[error(
        "Command '{command}' is missing required parameter '{parameter}' (expects at least {required}, got {given})"
    )]
    MissingRequiredParameter {
        command: String,
        parameter: String,
        required: usize,
        given: usize,
    },
    #[error("Parameter '{parameter}' has unsupported type '{type_name}'")]
    UnsupportedParameterType { parameter: String, type_name: String },
    #[error("Parameter '{parameter}': cannot parse '{token}': {reason}")]
    ParseError {
        parameter: String,
        token: String,
        reason: String,
    },
    #[error("[{command}] requires an instance of '{type_name}' but none was found")]
    NoTargetInstance { command: String, type_name: String },
    #[error("Error executing command [{command}]: {message}")]
    ExecutionError { command: String, message: String },
}

impl ConsoleError {
    pub(crate) fn parse(
        parameter: &str,
        token: &str,
        reason: impl Into<String>,
    ) -> Self {
        ConsoleError::ParseError {
            parameter: parameter.to_string(),
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// Whole-discovery failures. Per-type failures never surface here; they are
/// logged and the type is skipped.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid module pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Errors from reading or writing the JSON files the console persists.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Serialize for ConsoleError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Command code returns `Result<(), String>`; this lets it use `?` on console errors.
impl From<ConsoleError> for String {
    fn from(e: ConsoleError) -> String {
        e.to_string()
    }
}
