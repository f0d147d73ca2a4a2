//! ci-report - CI report runner
//!
//! Runs the report steps against a checkout and posts the summary to a chat
//! webhook. Every flag falls back to the environment variable the CI job
//! exports, so the binary usually runs without arguments.
//!
//! Exit status is 0 when every gating step succeeded and 1 otherwise.

use anyhow::{Context, Result};
use ci_report_core::{
    DocsPublishConfig, ReportConfig, ReportError, ReportPipeline, RunReport, SystemCommandRunner,
};
use ci_report_notify::{NotifyConfig, NotifyError, WebhookNotifier};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[command(name = "ci-report")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check a checkout and report the results to a webhook", long_about = None)]
struct Cli {
    /// Repository slug (owner/name), used for source links
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Chat webhook receiving the report
    #[arg(long, env = "WEBHOOK_URL", required_unless_present = "dry_run")]
    webhook_url: Option<String>,

    /// Login of the push author
    #[arg(long, env = "PUSH_AUTHOR")]
    push_author: String,

    /// Commit message of the push
    #[arg(long, env = "PUSH_MESSAGE")]
    push_message: String,

    /// Link to the pushed commit
    #[arg(long, env = "PUSH_URL")]
    push_url: String,

    /// Git URL of the documentation repository; docs are skipped when unset
    #[arg(long, env = "DOC_REPOSITORY")]
    doc_repository: Option<String>,

    /// SSH private key used to push documentation
    #[arg(long, env = "SSH_PRIVATE_KEY", hide_env_values = true)]
    ssh_private_key: Option<String>,

    /// Where the SSH key is installed (default: ~/.ssh/id_rsa)
    #[arg(long, env = "SSH_KEY_PATH")]
    ssh_key_path: Option<PathBuf>,

    /// Branch used in source links
    #[arg(long, env = "REPORT_BRANCH", default_value = "main")]
    branch: String,

    /// Footer text of the message
    #[arg(long, env = "REPORT_FOOTER")]
    footer: Option<String>,

    /// Checkout to run in
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Print the webhook payload instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn report_config(&self) -> Result<ReportConfig> {
        let mut config =
            ReportConfig::new(&self.workdir, &self.repository).with_branch(&self.branch);

        if let Some(url) = &self.doc_repository {
            let key_path = match &self.ssh_key_path {
                Some(path) => path.clone(),
                None => default_key_path()?,
            };
            let mut docs = DocsPublishConfig::new(url, key_path).with_author(&self.push_author);
            if let Some(key) = &self.ssh_private_key {
                docs = docs.with_private_key(key);
            }
            config = config.with_docs(docs);
        }
        Ok(config)
    }

    fn notify_config(&self) -> NotifyConfig {
        let mut config = NotifyConfig::new(&self.push_author, &self.push_message, &self.push_url);
        if let Some(url) = &self.webhook_url {
            config = config.with_webhook(url);
        }
        if let Some(footer) = &self.footer {
            config = config.with_footer(footer);
        }
        config
    }
}

fn default_key_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Cannot locate home directory for the SSH key")?;
    Ok(home.join(".ssh").join("id_rsa"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ci_report_core::init_tracing(cli.json, level);

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            let chain: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
            error!(
                kind = error_kind(&err),
                error = %err,
                cause = ?chain,
                "ci-report aborted"
            );
            ExitCode::FAILURE
        }
    }
}

/// Run the pipeline and deliver the report. `Ok(false)` means a gating step
/// failed.
async fn run(cli: &Cli) -> Result<bool> {
    let config = cli.report_config()?;
    let pipeline = ReportPipeline::new(config, Arc::new(SystemCommandRunner));
    let report = pipeline.run().await.context("Report pipeline failed")?;
    log_summary(&report);

    let notifier =
        WebhookNotifier::new(cli.notify_config()).context("Failed to create HTTP client")?;

    if cli.dry_run {
        let payload = notifier.build_payload(&report);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        notifier.send(&report).await.context("Failed to deliver report")?;
    }

    Ok(report.success())
}

fn log_summary(report: &RunReport) {
    for step in &report.steps {
        info!(step = step.kind.name(), status = ?step.status, "Step result");
    }
    for violation in &report.verdict.violations {
        info!(violation = %violation, "Gate violation");
    }
    info!(
        run_id = %report.run_id,
        passed = report.passed_count(),
        total = report.steps.len(),
        health = ?report.verdict.health,
        "Summary"
    );
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<ReportError>() {
        e.kind()
    } else if let Some(e) = err.downcast_ref::<NotifyError>() {
        e.kind()
    } else {
        "internal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut args = vec![
            "ci-report",
            "--repository",
            "acme/widget",
            "--push-author",
            "octocat",
            "--push-message",
            "Fix the widget",
            "--push-url",
            "https://github.com/acme/widget/commit/abc123",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_dry_run_needs_no_webhook() {
        let cli = parse(&["--dry-run"]);
        assert!(cli.dry_run);
        assert_eq!(cli.workdir, PathBuf::from("."));
    }

    #[test]
    fn test_report_config_without_docs() {
        let cli = parse(&["--dry-run", "--branch", "dev"]);
        let config = cli.report_config().unwrap();
        assert_eq!(config.repository, "acme/widget");
        assert_eq!(config.branch, "dev");
        assert!(config.docs.is_none());
    }

    #[test]
    fn test_report_config_with_docs() {
        let cli = parse(&[
            "--dry-run",
            "--doc-repository",
            "git@github.com:acme/docs.git",
            "--ssh-key-path",
            "/tmp/key",
            "--ssh-private-key",
            "KEY",
        ]);
        let docs = cli.report_config().unwrap().docs.unwrap();
        assert_eq!(docs.repository_url, "git@github.com:acme/docs.git");
        assert_eq!(docs.ssh_key_path, PathBuf::from("/tmp/key"));
        assert_eq!(docs.ssh_private_key.as_deref(), Some("KEY"));
        assert_eq!(docs.author, "octocat");
    }

    #[test]
    fn test_notify_config_from_flags() {
        let cli = parse(&[
            "--webhook-url",
            "https://hooks.example.com/1",
            "--footer",
            "custom",
        ]);
        let config = cli.notify_config();
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.com/1")
        );
        assert_eq!(config.author, "octocat");
        assert_eq!(config.footer, "custom");
    }

    #[test]
    fn test_error_kind_of_report_error() {
        let err = anyhow::Error::new(ReportError::Config("bad".to_string()))
            .context("Report pipeline failed");
        assert_eq!(error_kind(&err), "config");
        assert_eq!(error_kind(&anyhow::anyhow!("other")), "internal");
    }

    #[tokio::test]
    async fn test_dry_run_on_empty_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().to_str().unwrap();
        let cli = parse(&["--dry-run", "--workdir", workdir]);
        // gitleaks may be absent; either way the run completes with a verdict.
        let outcome = run(&cli).await;
        assert!(outcome.is_ok(), "run failed: {:?}", outcome.err());
    }
}
