//! Coding-style report summary.
//!
//! The checker leaves a `coding-style-reports.log` in the checkout with one
//! `file:line:severity:rule` entry per line, e.g.
//! `./src/main.c:12: MAJOR:C-O1`. Each entry becomes a markdown bullet linking
//! to the offending line; anything else is kept verbatim. The report is
//! consumed: the file is deleted once read.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::stage::{StepKind, StepResult, StepStatus};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Report file, relative to the checkout.
pub const CODING_STYLE_REPORT: &str = "coding-style-reports.log";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Minor,
    Major,
}

impl Severity {
    /// Parse a severity field, ignoring case and any whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "INFO" => Some(Severity::Info),
            "MINOR" => Some(Severity::Minor),
            "MAJOR" => Some(Severity::Major),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
        }
    }

    fn ansi_color(&self) -> &'static str {
        match self {
            Severity::Info => "36",
            Severity::Minor => "33",
            Severity::Major => "31",
        }
    }

    /// Whether findings of this severity fail the step.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Severity::Info)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single entry of the coding-style report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintFinding {
    pub file: String,
    pub line: String,
    pub severity: Severity,
    pub rule: String,
}

impl LintFinding {
    /// Parse `file:line:severity:rule`.
    ///
    /// Returns `None` unless the line has exactly three colons and a known
    /// severity.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(':').collect();
        let [file, line_no, severity, rule] = parts.as_slice() else {
            return None;
        };
        Some(LintFinding {
            file: file.trim().to_string(),
            line: line_no.trim().to_string(),
            severity: Severity::parse(severity)?,
            rule: rule.trim().to_string(),
        })
    }

    /// Markdown bullet with a colored severity tag and a link to the line.
    pub fn render(&self, config: &ReportConfig) -> String {
        format!(
            "- [\x1b[{}m{}\x1b[0m] (on [{}:{}]({})): {}",
            self.severity.ansi_color(),
            self.severity,
            self.file,
            self.line,
            config.source_link(&self.file, &self.line),
            self.rule
        )
    }
}

/// Finding counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSummary {
    pub info: usize,
    pub minor: usize,
    pub major: usize,
}

impl LintSummary {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Minor => self.minor += 1,
            Severity::Major => self.major += 1,
        }
    }

    /// Findings that fail the step.
    pub fn failures(&self) -> usize {
        self.minor + self.major
    }

    /// No findings at all.
    pub fn is_clean(&self) -> bool {
        self.info + self.minor + self.major == 0
    }

    pub fn status(&self) -> StepStatus {
        if self.failures() > 0 {
            StepStatus::Failed
        } else if !self.is_clean() {
            StepStatus::PassedWithWarnings
        } else {
            StepStatus::Passed
        }
    }

    fn header(&self) -> String {
        format!(
            "You have \x1b[31m{}\x1b[0m major errors, \x1b[33m{}\x1b[0m minor errors and \x1b[34m{}\x1b[0m infos :\n\n",
            self.major, self.minor, self.info
        )
    }
}

/// Render a report's contents; returns the rendered body and the counts.
pub fn summarize_report(contents: &str, config: &ReportConfig) -> (String, LintSummary) {
    let mut summary = LintSummary::default();
    let mut body = String::new();

    for line in contents.lines() {
        match LintFinding::parse(line) {
            Some(finding) => {
                summary.record(finding.severity);
                body.push_str(&finding.render(config));
            }
            None => body.push_str(line),
        }
        body.push('\n');
    }

    (body, summary)
}

/// Summarize and consume the coding-style report of the checkout.
pub fn run_coding_style(config: &ReportConfig) -> Result<StepResult> {
    let path = config.workdir.join(CODING_STYLE_REPORT);
    if !path.is_file() {
        info!(step = "coding_style", "No coding-style report, ignoring");
        return Ok(StepResult::ignored(
            StepKind::CodingStyle,
            CODING_STYLE_REPORT,
        ));
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ReportError::at_path(&path, e))?;
    let (body, summary) = summarize_report(&contents, config);

    if let Err(e) = std::fs::remove_file(&path) {
        warn!(step = "coding_style", path = %path.display(), error = %e, "Failed to remove report");
    }

    info!(
        step = "coding_style",
        info = summary.info,
        minor = summary.minor,
        major = summary.major,
        "Coding-style report summarized"
    );

    let mut logs = summary.header();
    logs.push_str(&body);
    Ok(StepResult::new(StepKind::CodingStyle, summary.status(), logs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> ReportConfig {
        ReportConfig::new(dir, "acme/widget")
    }

    #[test]
    fn test_severity_parse_ignores_case_and_space() {
        assert_eq!(Severity::parse(" MAJOR"), Some(Severity::Major));
        assert_eq!(Severity::parse("minor "), Some(Severity::Minor));
        assert_eq!(Severity::parse(" In fo "), Some(Severity::Info));
        assert_eq!(Severity::parse("FATAL"), None);
    }

    #[test]
    fn test_parse_well_formed_line() {
        let finding = LintFinding::parse("./src/main.c:12: MAJOR:C-O1").unwrap();
        assert_eq!(finding.file, "./src/main.c");
        assert_eq!(finding.line, "12");
        assert_eq!(finding.severity, Severity::Major);
        assert_eq!(finding.rule, "C-O1");
    }

    #[test]
    fn test_parse_rejects_wrong_colon_count() {
        assert!(LintFinding::parse("garbage line").is_none());
        assert!(LintFinding::parse("a:1:MAJOR").is_none());
        assert!(LintFinding::parse("a:1:MAJOR:C-O1:extra").is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_severity() {
        assert!(LintFinding::parse("a.c:1:FATAL:C-O1").is_none());
    }

    #[test]
    fn test_render_links_to_source_line() {
        let config = ReportConfig::new(".", "acme/widget");
        let finding = LintFinding::parse("./src/a.c:10:MAJOR:C-O1").unwrap();
        assert_eq!(
            finding.render(&config),
            "- [\x1b[31mMAJOR\x1b[0m] (on [./src/a.c:10](https://github.com/acme/widget/blob/main/src/a.c#L10)): C-O1"
        );
    }

    #[test]
    fn test_summarize_passes_unparsed_lines_through() {
        let config = ReportConfig::new(".", "acme/widget");
        let (body, summary) = summarize_report(
            "src/a.c:1:INFO:C-G1\nnot: a: finding\n\nsrc/a.c:2:WHAT:C-G1\n",
            &config,
        );
        assert_eq!(summary.info, 1);
        assert_eq!(summary.failures(), 0);
        assert!(body.contains("\nnot: a: finding\n\n"));
        assert!(body.contains("src/a.c:2:WHAT:C-G1\n"));
    }

    #[test]
    fn test_summary_status() {
        assert_eq!(LintSummary::default().status(), StepStatus::Passed);
        let infos = LintSummary {
            info: 2,
            ..Default::default()
        };
        assert_eq!(infos.status(), StepStatus::PassedWithWarnings);
        let minor = LintSummary {
            minor: 1,
            ..Default::default()
        };
        assert_eq!(minor.status(), StepStatus::Failed);
    }

    #[test]
    fn test_missing_report_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_coding_style(&config_in(dir.path())).unwrap();
        assert_eq!(result.status, StepStatus::Skipped);
        assert!(result.passed());
        assert_eq!(
            result.logs,
            "No \"coding-style-reports.log\" file found.\nIgnoring"
        );
    }

    #[test]
    fn test_report_with_failures_is_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join(CODING_STYLE_REPORT);
        std::fs::write(
            &report,
            "src/a.c:10:MAJOR:C-O1\nsrc/b.c:2:MINOR:C-O2\ngarbage line\n",
        )
        .unwrap();

        let result = run_coding_style(&config_in(dir.path())).unwrap();

        assert_eq!(result.status, StepStatus::Failed);
        assert!(!report.exists());
        assert!(result.logs.starts_with(
            "You have \x1b[31m1\x1b[0m major errors, \x1b[33m1\x1b[0m minor errors and \x1b[34m0\x1b[0m infos :\n\n"
        ));
        assert!(result.logs.contains("\ngarbage line\n"));
        assert!(result.logs.contains("#L10)): C-O1"));
        assert!(result.logs.contains("#L2)): C-O2"));
    }

    #[test]
    fn test_info_only_report_passes_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CODING_STYLE_REPORT),
            "src/a.c:3: INFO:C-L3\n",
        )
        .unwrap();

        let result = run_coding_style(&config_in(dir.path())).unwrap();

        assert_eq!(result.status, StepStatus::PassedWithWarnings);
        assert!(result.passed());
    }

    #[test]
    fn test_empty_report_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CODING_STYLE_REPORT), "").unwrap();

        let result = run_coding_style(&config_in(dir.path())).unwrap();

        assert_eq!(result.status, StepStatus::Passed);
    }
}
