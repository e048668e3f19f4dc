use std::io;
use std::time::Duration;

/// Errors that can occur during xcresolve operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Failures of an external query (build settings dump or test case listing)
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to launch {tool}: {source}")]
    Spawn { tool: String, source: io::Error },

    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} timed out after {}s", .after.as_secs())]
    TimedOut { tool: String, after: Duration },

    #[error("{tool} produced unreadable output: {message}")]
    InvalidOutput { tool: String, message: String },

    #[error("{0}")]
    Unsupported(String),

    #[error("query cancelled")]
    Cancelled,
}

impl QueryError {
    pub fn failed(
        tool: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Failed {
            tool: tool.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    pub fn invalid_output(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Resolution of a target was aborted by its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("resolution cancelled")]
pub struct Cancelled;

/// Result type alias for xcresolve operations
pub type Result<T> = std::result::Result<T, Error>;
