//! Webhook payload schema (Discord-compatible embed message).

use crate::template::{render_message, truncate_description, DESCRIPTION_LIMIT};
use crate::NotifyConfig;
use chrono::{DateTime, Utc};
use ci_report_core::{RunHealth, RunReport};
use serde::{Deserialize, Serialize};

/// Embed color for a fully successful run.
pub const SUCCESS_COLOR: u32 = 5439232;

/// Embed color for a run that passed with warnings.
pub const PARTIAL_COLOR: u32 = 16750848;

/// Embed color for a failed run.
pub const FAILURE_COLOR: u32 = 16711680;

pub fn health_color(health: RunHealth) -> u32 {
    match health {
        RunHealth::Success => SUCCESS_COLOR,
        RunHealth::Partial => PARTIAL_COLOR,
        RunHealth::Failure => FAILURE_COLOR,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookPayload {
    pub username: String,
    pub avatar_url: String,
    pub embeds: Vec<Embed>,
    pub allowed_mentions: AllowedMentions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embed {
    pub color: u32,
    pub author: EmbedAuthor,
    pub title: String,
    pub url: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

impl WebhookPayload {
    /// Build the message for a finished run.
    pub fn for_report(report: &RunReport, config: &NotifyConfig) -> Self {
        Self::with_description(
            render_message(report),
            health_color(report.verdict.health),
            config,
        )
    }

    /// Build a message around an already rendered description.
    pub fn with_description(description: String, color: u32, config: &NotifyConfig) -> Self {
        let author = config.author.as_str();
        let profile = format!("{}/{}", config.profile_host.trim_end_matches('/'), author);
        Self {
            username: format!("Github - {}", author),
            avatar_url: format!("{}.png", profile),
            embeds: vec![Embed {
                color,
                author: EmbedAuthor {
                    name: author.to_string(),
                    url: format!("{}/", profile),
                    icon_url: format!("{}.png", profile),
                },
                title: config.push_message.clone(),
                url: config.push_url.clone(),
                description: truncate_description(&description, DESCRIPTION_LIMIT),
                timestamp: Utc::now(),
                footer: EmbedFooter {
                    text: config.footer.clone(),
                },
            }],
            allowed_mentions: AllowedMentions {
                parse: vec!["everyone".to_string()],
            },
        }
    }
}
