//! Run verdict from step results.

use crate::stage::{StepResult, StepStatus};
use serde::{Deserialize, Serialize};

/// How healthy a run is; drives the color of the chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunHealth {
    /// Every step passed cleanly.
    Success,

    /// Gating steps passed, but something deserves attention.
    Partial,

    /// A gating step failed.
    Failure,
}

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether every gating step succeeded.
    pub passed: bool,

    pub health: RunHealth,

    /// One entry per failed step (empty if all passed).
    pub violations: Vec<String>,
}

/// Gate evaluation rules.
pub struct ReportGate;

impl ReportGate {
    /// Evaluate step results.
    ///
    /// Gate rule:
    /// - The run passes iff no gating step failed
    /// - Health is `Failure` when the run does not pass
    /// - Health is `Partial` when the run passes but a step passed with
    ///   warnings or a non-gating step failed
    /// - Otherwise health is `Success`
    pub fn evaluate(steps: &[StepResult]) -> GateVerdict {
        let mut violations = Vec::new();
        let mut gating_failed = false;
        let mut attention = false;

        for step in steps {
            match step.status {
                StepStatus::Failed => {
                    if step.kind.is_gating() {
                        gating_failed = true;
                        violations.push(format!("Step '{}' failed", step.kind));
                    } else {
                        attention = true;
                        violations.push(format!("Non-gating step '{}' failed", step.kind));
                    }
                }
                StepStatus::PassedWithWarnings => attention = true,
                StepStatus::Passed | StepStatus::Skipped => {}
            }
        }

        let health = if gating_failed {
            RunHealth::Failure
        } else if attention {
            RunHealth::Partial
        } else {
            RunHealth::Success
        };

        GateVerdict {
            passed: !gating_failed,
            health,
            violations,
        }
    }
}
