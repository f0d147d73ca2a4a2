//! ci-report notify - chat webhook delivery
//!
//! Renders a [`RunReport`](ci_report_core::RunReport) into a colored embed
//! message and posts it once to a Discord-compatible webhook.

pub mod client;
pub mod error;
pub mod payload;
pub mod template;

pub use client::{NotifyConfig, WebhookNotifier};
pub use error::NotifyError;
pub use payload::{health_color, Embed, WebhookPayload};
pub use template::{render_message, truncate_description};

/// Result type for ci-report-notify operations
pub type Result<T> = std::result::Result<T, NotifyError>;
