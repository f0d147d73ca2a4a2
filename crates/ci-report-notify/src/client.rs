//! Webhook delivery client

use crate::error::NotifyError;
use crate::payload::WebhookPayload;
use crate::Result;
use ci_report_core::RunReport;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Footer text used when none is configured.
pub const DEFAULT_FOOTER: &str = "Report any problem to the repository maintainers";

/// Host serving author profiles and avatars.
pub const DEFAULT_PROFILE_HOST: &str = "https://github.com";

/// Who pushed what, and where the message goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook endpoint (optional for dry runs)
    pub webhook_url: Option<String>,
    /// Login of the push author
    pub author: String,
    /// Commit message shown as the embed title
    pub push_message: String,
    /// Link to the pushed commit
    pub push_url: String,
    pub footer: String,
    pub profile_host: String,
}

impl NotifyConfig {
    pub fn new(author: &str, push_message: &str, push_url: &str) -> Self {
        NotifyConfig {
            webhook_url: None,
            author: author.to_string(),
            push_message: push_message.to_string(),
            push_url: push_url.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
            profile_host: DEFAULT_PROFILE_HOST.to_string(),
        }
    }

    /// Set the webhook endpoint
    pub fn with_webhook(mut self, url: &str) -> Self {
        self.webhook_url = Some(url.to_string());
        self
    }

    /// Override the footer text
    pub fn with_footer(mut self, footer: &str) -> Self {
        self.footer = footer.to_string();
        self
    }
}

/// Posts run reports to a chat webhook.
pub struct WebhookNotifier {
    config: NotifyConfig,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ci-report/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(WebhookNotifier {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    pub fn build_payload(&self, report: &RunReport) -> WebhookPayload {
        WebhookPayload::for_report(report, &self.config)
    }

    /// Send the report once.
    ///
    /// A transport failure is an error. A non-2xx answer is only logged.
    pub async fn send(&self, report: &RunReport) -> Result<()> {
        let payload = self.build_payload(report);
        self.deliver(&payload).await
    }

    pub async fn deliver(&self, payload: &WebhookPayload) -> Result<()> {
        let url = self
            .config
            .webhook_url
            .as_deref()
            .ok_or(NotifyError::MissingWebhook)?;

        debug!(
            bytes = payload.embeds.first().map(|e| e.description.len()).unwrap_or(0),
            "Posting report to webhook"
        );
        let response = self.http_client.post(url).json(payload).send().await?;
        let status = response.status();

        if status.is_success() {
            info!(
                event = "webhook.delivered",
                status = status.as_u16(),
                "Report delivered"
            );
        } else {
            warn!(
                event = "webhook.rejected",
                status = status.as_u16(),
                "Webhook answered with a non-success status"
            );
        }
        Ok(())
    }
}
