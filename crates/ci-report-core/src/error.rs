//! Error types for report step execution

use thiserror::Error;

/// Errors that abort a report run.
///
/// Tool failures and malformed inputs are not errors: they are recorded as a
/// failed step. These variants cover the cases where the runner itself cannot
/// continue (e.g. a report file exists but cannot be read).
#[derive(Error, Debug)]
pub enum ReportError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO error tied to a specific path
    #[error("IO error on {path}: {source}")]
    PathIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid runner configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    /// Attach the offending path to an IO error.
    pub fn at_path(path: &std::path::Path, source: std::io::Error) -> Self {
        ReportError::PathIo {
            path: path.display().to_string(),
            source,
        }
    }

    /// Short machine-friendly name of the error kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::Io(_) | ReportError::PathIo { .. } => "io",
            ReportError::Json(_) => "json",
            ReportError::Config(_) => "config",
        }
    }
}
