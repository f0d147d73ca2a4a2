//! Runner configuration.
//!
//! The binary builds these from command-line flags with environment
//! fallbacks; the library only sees plain values.

use crate::error::ReportError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default host used to build links to source lines.
pub const DEFAULT_SOURCE_HOST: &str = "https://github.com";

/// Default branch used in source links.
pub const DEFAULT_BRANCH: &str = "main";

/// Configuration shared by every step of a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Repository checkout the steps run against.
    pub workdir: PathBuf,

    /// Repository identifier, `owner/name`.
    pub repository: String,

    /// Branch used when linking lint findings to source lines.
    pub branch: String,

    /// Base URL of the source host.
    pub source_host: String,

    /// Documentation publishing target; `None` skips the documentation step.
    pub docs: Option<DocsPublishConfig>,
}

impl ReportConfig {
    /// Create a configuration with default branch and source host.
    pub fn new(workdir: impl Into<PathBuf>, repository: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            repository: repository.into(),
            branch: DEFAULT_BRANCH.to_string(),
            source_host: DEFAULT_SOURCE_HOST.to_string(),
            docs: None,
        }
    }

    /// Set the branch used in source links.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Enable documentation publishing.
    pub fn with_docs(mut self, docs: DocsPublishConfig) -> Self {
        self.docs = Some(docs);
        self
    }

    /// Reject configurations no step could run with.
    pub fn validate(&self) -> Result<()> {
        if self.repository.trim().is_empty() {
            return Err(ReportError::Config(
                "repository must not be empty".to_string(),
            ));
        }
        if !self.workdir.is_dir() {
            return Err(ReportError::Config(format!(
                "working directory {} does not exist",
                self.workdir.display()
            )));
        }
        Ok(())
    }

    /// Link to a line of a file on the source host.
    pub fn source_link(&self, file: &str, line: &str) -> String {
        format!(
            "{}/{}/blob/{}/{}#L{}",
            self.source_host.trim_end_matches('/'),
            self.repository,
            self.branch,
            file.trim_start_matches("./"),
            line
        )
    }
}

/// Where and how generated documentation is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsPublishConfig {
    /// SSH URL of the documentation repository.
    pub repository_url: String,

    /// Private key material; required to publish.
    #[serde(skip_serializing)]
    pub ssh_private_key: Option<String>,

    /// Where the private key is written before cloning.
    pub ssh_key_path: PathBuf,

    /// Name used as commit author in the documentation repository.
    pub author: String,
}

impl DocsPublishConfig {
    pub fn new(repository_url: impl Into<String>, ssh_key_path: impl Into<PathBuf>) -> Self {
        Self {
            repository_url: repository_url.into(),
            ssh_private_key: None,
            ssh_key_path: ssh_key_path.into(),
            author: "ci-report".to_string(),
        }
    }

    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.ssh_private_key = Some(key.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Value of `GIT_SSH_COMMAND` for git invocations against the docs repo.
    pub fn git_ssh_command(&self) -> String {
        format!(
            "ssh -i {} -o StrictHostKeyChecking=no -l git",
            self.ssh_key_path.display()
        )
    }
}
