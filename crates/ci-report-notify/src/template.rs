//! Chat message rendering.
//!
//! Each step becomes an ANSI code block with its status, followed by its logs:
//!
//! ````text
//! ```ansi
//! Compilation Success
//! ```
//!
//! Logs :
//! ```ansi
//! ~$ make
//! ...
//! ```
//! ````

use ci_report_core::{RunReport, StepKind, StepResult, StepStatus};

/// Discord's limit on embed descriptions, in characters.
pub const DESCRIPTION_LIMIT: usize = 4096;

const TRUNCATION_MARKER: &str = "\n```\n(report truncated)";

const LOG_TRUNCATION_MARKER: &str = "\n(log truncated)";

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Passed | StepStatus::PassedWithWarnings => "\x1b[32mSuccess\x1b[0m",
        StepStatus::Skipped => "\x1b[34mSkipped\x1b[0m",
        StepStatus::Failed => "\x1b[31mFailure\x1b[0m",
    }
}

/// Label above the log block of a step.
fn logs_label(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Compilation | StepKind::UnitTests => "Logs",
        StepKind::CodingStyle => "Coding style",
        StepKind::SecretScan => "GitLeaks",
        StepKind::Documentation => "Documentation",
    }
}

fn render_step(out: &mut String, step: &StepResult, logs: &str) {
    // The coding-style summary carries its own counts, no status header.
    if step.kind != StepKind::CodingStyle {
        out.push_str(&format!(
            "```ansi\n{} {}\n```\n\n",
            step.kind.title(),
            status_label(step.status)
        ));
    }
    out.push_str(&format!(
        "{} :\n```ansi\n{}\n```\n",
        logs_label(step.kind),
        logs
    ));
}

fn render_sections(steps: &[&StepResult], logs: &[&str]) -> String {
    let sections: Vec<String> = steps
        .iter()
        .zip(logs)
        .map(|(step, logs)| {
            let mut section = String::new();
            render_step(&mut section, step, logs);
            section
        })
        .collect();
    sections.join("\n")
}

/// Render the full message for a run, steps in execution order, within
/// [`DESCRIPTION_LIMIT`].
pub fn render_message(report: &RunReport) -> String {
    render_message_within(report, DESCRIPTION_LIMIT)
}

/// Render the message in at most `limit` characters.
///
/// When the logs do not fit, each log block is cut to its share of the room
/// left by the status headers, so every step keeps its section.
pub fn render_message_within(report: &RunReport, limit: usize) -> String {
    let steps: Vec<&StepResult> = StepKind::ALL
        .iter()
        .filter_map(|kind| report.step(*kind))
        .collect();
    let logs: Vec<&str> = steps.iter().map(|s| s.logs.as_str()).collect();

    let full = render_sections(&steps, &logs);
    if full.chars().count() <= limit {
        return full;
    }

    let empty = vec![""; steps.len()];
    let overhead = render_sections(&steps, &empty).chars().count();
    let lengths: Vec<usize> = logs.iter().map(|l| l.chars().count()).collect();
    let shares = fair_shares(&lengths, limit.saturating_sub(overhead));

    let cut: Vec<String> = logs
        .iter()
        .zip(&shares)
        .map(|(logs, share)| cut_log(logs, *share))
        .collect();
    let cut_refs: Vec<&str> = cut.iter().map(String::as_str).collect();
    truncate_description(&render_sections(&steps, &cut_refs), limit)
}

/// Split `budget` between blocks: short blocks keep everything, the rest
/// share what remains equally.
fn fair_shares(lengths: &[usize], budget: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..lengths.len()).collect();
    order.sort_by_key(|&i| lengths[i]);

    let mut shares = vec![0; lengths.len()];
    let mut remaining = budget;
    for (pos, &i) in order.iter().enumerate() {
        let share = lengths[i].min(remaining / (lengths.len() - pos));
        shares[i] = share;
        remaining -= share;
    }
    shares
}

fn cut_log(logs: &str, share: usize) -> String {
    if logs.chars().count() <= share {
        return logs.to_string();
    }
    let keep = share.saturating_sub(LOG_TRUNCATION_MARKER.chars().count());
    let mut cut: String = logs.chars().take(keep).collect();
    cut.push_str(LOG_TRUNCATION_MARKER);
    cut
}

/// Cut `text` to at most `limit` characters, marking the cut.
pub fn truncate_description(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
