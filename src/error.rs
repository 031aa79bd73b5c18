//! Error types for linkflow.
//!
//! Every variant carries a stable code so dashboards and schedulers can
//! branch on the failure class without parsing messages.

use thiserror::Error;

/// Result type alias for linkflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// linkflow error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The graph cannot be traversed (trigger count, fan-out, duplicate ids).
    #[error("Graph structure error: {0}")]
    Graph(String),

    /// A node executor failed.
    #[error("Executor error: {0}")]
    Executor(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Graph(_) => "GRAPH_ERROR",
            Error::Executor(_) => "EXECUTOR_ERROR",
            Error::Parse(_) => "PARSE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Storage(_) => "STORAGE_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// The bare message without the variant prefix.
    ///
    /// Log entries and execution records store this so the dashboard can show
    /// the executor's own wording.
    pub fn message(&self) -> String {
        match self {
            Error::Graph(msg)
            | Error::Executor(msg)
            | Error::Parse(msg)
            | Error::Config(msg)
            | Error::Storage(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Convert to a JSON error body.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        })
    }
}
