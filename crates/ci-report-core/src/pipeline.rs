//! Report pipeline orchestration.

use crate::config::ReportConfig;
use crate::gate::{GateVerdict, ReportGate};
use crate::obs;
use crate::runner::CommandRunner;
use crate::stage::{StepKind, StepResult};
use crate::steps;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, Instrument};
use uuid::Uuid;

/// Result of a complete report run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Identifier correlating log lines of this run.
    pub run_id: String,

    /// Results of individual steps, in execution order.
    pub steps: Vec<StepResult>,

    pub verdict: GateVerdict,

    /// Total duration.
    pub duration: Duration,
}

impl RunReport {
    /// Build a report from step results, evaluating the gate.
    pub fn new(run_id: impl Into<String>, steps: Vec<StepResult>, duration: Duration) -> Self {
        let verdict = ReportGate::evaluate(&steps);
        Self {
            run_id: run_id.into(),
            steps,
            verdict,
            duration,
        }
    }

    /// Whether every gating step succeeded.
    pub fn success(&self) -> bool {
        self.verdict.passed
    }

    pub fn step(&self, kind: StepKind) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    /// Number of steps that passed (skips included).
    pub fn passed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.passed()).count()
    }

    /// Number of steps that failed.
    pub fn failed_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.passed()).count()
    }
}

/// Report pipeline orchestrator.
pub struct ReportPipeline {
    config: ReportConfig,
    runner: Arc<dyn CommandRunner>,
}

impl ReportPipeline {
    pub fn new(config: ReportConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Run every step in order and evaluate the gate.
    ///
    /// Steps never stop the pipeline by failing; an `Err` means the runner
    /// itself could not proceed.
    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        obs::emit_run_started(&run_id, &self.config.repository);

        let results = self
            .run_all_steps()
            .instrument(obs::run_span(&run_id))
            .await?;

        let report = RunReport::new(run_id, results, start.elapsed());
        obs::emit_gate_evaluated(&report.verdict);
        obs::emit_run_finished(
            &report.run_id,
            report.duration.as_millis() as u64,
            report.success(),
        );
        info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            "Report pipeline finished"
        );
        Ok(report)
    }

    async fn run_all_steps(&self) -> Result<Vec<StepResult>> {
        let mut results = Vec::with_capacity(StepKind::ALL.len());
        for kind in StepKind::ALL {
            obs::emit_step_started(kind.name());
            let result = self.run_step(kind).await?;
            obs::emit_step_finished(&result);
            results.push(result);
        }
        Ok(results)
    }

    /// Run a single step.
    pub async fn run_step(&self, kind: StepKind) -> Result<StepResult> {
        let runner = self.runner.as_ref();
        let workdir = self.config.workdir.as_path();
        match kind {
            StepKind::Compilation => steps::run_compilation(runner, workdir).await,
            StepKind::UnitTests => steps::run_unit_tests(runner, workdir).await,
            StepKind::CodingStyle => steps::run_coding_style(&self.config),
            StepKind::SecretScan => steps::run_secret_scan(runner, workdir).await,
            StepKind::Documentation => steps::run_documentation(runner, &self.config).await,
        }
    }
}
