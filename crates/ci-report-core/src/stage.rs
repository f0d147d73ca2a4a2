//! Report step definitions and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The fixed set of report steps, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// make / cmake build
    Compilation,

    /// tests/run_unit_tests.sh
    UnitTests,

    /// coding-style-reports.log summary
    CodingStyle,

    /// gitleaks detect
    SecretScan,

    /// doxide + mkdocs build and publish
    Documentation,
}

impl StepKind {
    /// All steps in execution order.
    pub const ALL: [StepKind; 5] = [
        StepKind::Compilation,
        StepKind::UnitTests,
        StepKind::CodingStyle,
        StepKind::SecretScan,
        StepKind::Documentation,
    ];

    /// Get the step name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Compilation => "compilation",
            StepKind::UnitTests => "unit_tests",
            StepKind::CodingStyle => "coding_style",
            StepKind::SecretScan => "secret_scan",
            StepKind::Documentation => "documentation",
        }
    }

    /// Heading used in the chat message.
    pub fn title(&self) -> &'static str {
        match self {
            StepKind::Compilation => "Compilation",
            StepKind::UnitTests => "Unit testing",
            StepKind::CodingStyle => "Coding style",
            StepKind::SecretScan => "GitLeaks",
            StepKind::Documentation => "Documentation",
        }
    }

    /// Whether a failure of this step fails the whole run.
    pub fn is_gating(&self) -> bool {
        !matches!(self, StepKind::Documentation)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,

    /// Passed, but with findings worth a look (info-level lint findings).
    PassedWithWarnings,

    /// Inputs for the step were absent; counts as success.
    Skipped,

    Failed,
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, StepStatus::Failed)
    }
}

/// Result of a step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub kind: StepKind,
    pub status: StepStatus,

    /// Captured log text shown in the report.
    pub logs: String,

    /// Wall-clock duration of the step's commands, when any ran.
    pub elapsed: Option<Duration>,
}

impl StepResult {
    pub fn new(kind: StepKind, status: StepStatus, logs: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            logs: logs.into(),
            elapsed: None,
        }
    }

    /// Passed when `success`, failed otherwise.
    pub fn from_success(kind: StepKind, success: bool, logs: impl Into<String>) -> Self {
        let status = if success {
            StepStatus::Passed
        } else {
            StepStatus::Failed
        };
        Self::new(kind, status, logs)
    }

    /// Skipped result with the conventional "not found, ignoring" log.
    pub fn ignored(kind: StepKind, what: &str) -> Self {
        Self::new(
            kind,
            StepStatus::Skipped,
            format!("No \"{}\" file found.\nIgnoring", what),
        )
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    pub fn passed(&self) -> bool {
        self.status.is_success()
    }
}

/// Format a duration as `HHh:MMm:SSs.mmm`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    let millis = elapsed.subsec_millis();
    format!("{:02}h:{:02}m:{:02}s.{:03}", hours, minutes, seconds, millis)
}

/// `\n<label> took <elapsed> to complete`, elapsed highlighted in magenta.
pub fn elapsed_line(label: &str, elapsed: Duration) -> String {
    format!(
        "\n{} took \x1b[35m{}\x1b[0m to complete",
        label,
        format_elapsed(elapsed)
    )
}
