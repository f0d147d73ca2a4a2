//! Error types for ci-report-notify

use thiserror::Error;

/// Errors that can occur while delivering a notification
#[derive(Error, Debug)]
pub enum NotifyError {
    /// No webhook endpoint configured
    #[error("No webhook URL configured")]
    MissingWebhook,

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err.to_string())
    }
}

impl NotifyError {
    /// Short machine-readable category, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::MissingWebhook => "config",
            NotifyError::Http(_) => "http",
        }
    }
}
