//! Structured observability hooks for report run lifecycle events.
//!
//! Events are emitted at `info!` level (filter with `CI_REPORT_LOG`).

use crate::gate::GateVerdict;
use crate::stage::StepResult;
use tracing::info;

/// Span tagging everything inside a run with its id.
///
/// ```ignore
/// async { /* steps */ }.instrument(run_span(&run_id)).await;
/// ```
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("ci_report.run", run_id = %run_id)
}

pub fn emit_run_started(run_id: &str, repository: &str) {
    info!(event = "run.started", run_id = %run_id, repository = %repository);
}

pub fn emit_step_started(step: &str) {
    info!(event = "step.started", step = %step);
}

pub fn emit_step_finished(result: &StepResult) {
    info!(
        event = "step.finished",
        step = %result.kind,
        status = ?result.status,
        elapsed_ms = result.elapsed.map(|d| d.as_millis() as u64),
        log_bytes = result.logs.len(),
    );
}

pub fn emit_gate_evaluated(verdict: &GateVerdict) {
    info!(
        event = "gate.evaluated",
        passed = verdict.passed,
        health = ?verdict.health,
        violations = verdict.violations.len(),
    );
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        success = success,
    );
}
