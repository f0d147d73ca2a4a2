//! Integration tests for the report pipeline with a scripted command runner.

use ci_report_core::fakes::ScriptedRunner;
use ci_report_core::{CommandOutput, ReportConfig, ReportPipeline, RunHealth, StepKind, StepStatus};
use std::path::Path;
use std::sync::Arc;

/// gitleaks writes `report` to its `-r` path; every other command succeeds.
fn toolchain(report: &'static str) -> ScriptedRunner {
    ScriptedRunner::new(move |spec| {
        if spec.program == "gitleaks" {
            std::fs::write(spec.args.last().unwrap(), report).unwrap();
        }
        CommandOutput::success("")
    })
}

fn checkout() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Test: an empty checkout passes every gating step vacuously
#[tokio::test]
async fn test_empty_checkout_succeeds() {
    let dir = checkout();
    let runner = Arc::new(toolchain("[]"));
    let pipeline = ReportPipeline::new(
        ReportConfig::new(dir.path(), "acme/widget"),
        runner.clone(),
    );

    let report = pipeline.run().await.expect("pipeline failed");

    assert!(report.success());
    assert_eq!(report.verdict.health, RunHealth::Success);
    assert_eq!(report.steps.len(), 5);
    let kinds: Vec<_> = report.steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, StepKind::ALL.to_vec());
    assert_eq!(
        report.step(StepKind::UnitTests).unwrap().status,
        StepStatus::Skipped
    );
    assert_eq!(
        report.step(StepKind::Documentation).unwrap().status,
        StepStatus::Skipped
    );
    // Only gitleaks ran.
    assert_eq!(runner.calls().len(), 1);
}

/// Test: lint failures fail the run, the report is consumed and raw lines kept
#[tokio::test]
async fn test_coding_style_failures_fail_the_run() {
    let dir = checkout();
    write(
        dir.path(),
        "coding-style-reports.log",
        "src/a.c:10:MAJOR:C-O1\nsrc/b.c:2:MINOR:C-O2\ngarbage line\n",
    );
    let pipeline = ReportPipeline::new(
        ReportConfig::new(dir.path(), "acme/widget"),
        Arc::new(toolchain("[]")),
    );

    let report = pipeline.run().await.expect("pipeline failed");

    assert!(!report.success());
    assert_eq!(report.verdict.health, RunHealth::Failure);
    let style = report.step(StepKind::CodingStyle).unwrap();
    assert_eq!(style.status, StepStatus::Failed);
    assert!(style.logs.contains("\x1b[31m1\x1b[0m major errors"));
    assert!(style.logs.contains("\x1b[33m1\x1b[0m minor errors"));
    assert!(style.logs.contains("\x1b[34m0\x1b[0m infos"));
    assert!(style.logs.contains("\ngarbage line\n"));
    assert!(!dir.path().join("coding-style-reports.log").exists());
    assert_eq!(report.verdict.violations, vec!["Step 'coding_style' failed"]);
}

/// Test: info-only lint findings give a partial (orange) success
#[tokio::test]
async fn test_info_findings_give_partial_success() {
    let dir = checkout();
    write(dir.path(), "coding-style-reports.log", "src/a.c:1: INFO:C-G1\n");
    let pipeline = ReportPipeline::new(
        ReportConfig::new(dir.path(), "acme/widget"),
        Arc::new(toolchain("[]")),
    );

    let report = pipeline.run().await.expect("pipeline failed");

    assert!(report.success());
    assert_eq!(report.verdict.health, RunHealth::Partial);
}

/// Test: leaked secrets fail the run
#[tokio::test]
async fn test_secret_findings_fail_the_run() {
    let dir = checkout();
    let pipeline = ReportPipeline::new(
        ReportConfig::new(dir.path(), "acme/widget"),
        Arc::new(toolchain(r#"[{"finding":"x"}]"#)),
    );

    let report = pipeline.run().await.expect("pipeline failed");

    assert!(!report.success());
    let scan = report.step(StepKind::SecretScan).unwrap();
    assert!(scan.logs.contains("Raw GitLeaks Json output"));
}

/// Test: a failing build and test launcher are both reported, pipeline continues
#[tokio::test]
async fn test_failing_tools_do_not_stop_later_steps() {
    let dir = checkout();
    write(dir.path(), "Makefile", "all:\n");
    write(dir.path(), "tests/run_unit_tests.sh", "#!/bin/sh\nexit 1\n");
    let runner = Arc::new(ScriptedRunner::new(|spec| match spec.program.as_str() {
        "gitleaks" => {
            std::fs::write(spec.args.last().unwrap(), "[]").unwrap();
            CommandOutput::success("")
        }
        _ => CommandOutput::failure("error\n", 2),
    }));
    let pipeline = ReportPipeline::new(
        ReportConfig::new(dir.path(), "acme/widget"),
        runner.clone(),
    );

    let report = pipeline.run().await.expect("pipeline failed");

    assert!(!report.success());
    assert_eq!(report.failed_count(), 2);
    assert_eq!(
        report.step(StepKind::SecretScan).unwrap().status,
        StepStatus::Passed
    );
    let programs: Vec<_> = runner.calls().into_iter().map(|c| c.program).collect();
    assert_eq!(programs[..2], ["make", "make"]);
    assert!(programs[2].ends_with("run_unit_tests.sh"));
    assert_eq!(programs[3], "gitleaks");
}

/// Test: a missing working directory is a configuration error, not a report
#[tokio::test]
async fn test_missing_workdir_is_an_error() {
    let dir = checkout();
    let pipeline = ReportPipeline::new(
        ReportConfig::new(dir.path().join("absent"), "acme/widget"),
        Arc::new(ScriptedRunner::succeeding()),
    );

    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.kind(), "config");
}
