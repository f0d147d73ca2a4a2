//! Secret scanning with gitleaks.

use crate::runner::{CommandRunner, CommandSpec};
use crate::stage::{StepKind, StepResult};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

const REPORT_NAME: &str = "gitleaks_output.json";

/// Run `gitleaks detect` on the checkout and inspect its JSON report.
///
/// Passes iff gitleaks exits 0 and the report is an empty array. Findings are
/// appended to the log pretty-printed.
pub async fn run_secret_scan(runner: &dyn CommandRunner, workdir: &Path) -> Result<StepResult> {
    let scratch = tempfile::tempdir()?;
    let report_path = scratch.path().join(REPORT_NAME);

    let out = runner
        .run(
            &CommandSpec::new("gitleaks")
                .args(["detect", "-f", "json", "-r"])
                .arg(report_path.display().to_string())
                .current_dir(workdir),
        )
        .await;
    let mut logs = out.output.clone();
    let mut success = out.succeeded();

    let findings = match read_findings(&report_path) {
        Ok(findings) => findings,
        Err(reason) => {
            warn!(step = "secret_scan", %reason, "Unusable gitleaks report");
            logs.push_str(&format!("\n\n{}", reason));
            return Ok(StepResult::from_success(StepKind::SecretScan, false, logs)
                .with_elapsed(out.duration));
        }
    };

    let count = findings.len();
    if count > 0 {
        success = false;
        logs.push_str("\n\nRaw GitLeaks Json output:\n\n");
        logs.push_str(&pretty_json(&Value::Array(findings))?);
    }

    info!(
        step = "secret_scan",
        findings = count,
        exit_code = ?out.exit_code,
        "Secret scan finished"
    );
    Ok(StepResult::from_success(StepKind::SecretScan, success, logs).with_elapsed(out.duration))
}

/// Load the report; the error string is shown in the step log.
fn read_findings(path: &Path) -> std::result::Result<Vec<Value>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("GitLeaks report {} could not be read: {}", path.display(), e))?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(findings)) => Ok(findings),
        Ok(_) => Err("GitLeaks report is not a JSON array".to_string()),
        Err(e) => Err(format!("GitLeaks report is not valid JSON: {}", e)),
    }
}

/// JSON with four-space indentation.
fn pretty_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
