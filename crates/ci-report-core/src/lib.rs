//! ci-report core - step execution for the CI report runner
//!
//! Runs a fixed sequence of steps against a repository checkout:
//! - Compilation (make / cmake)
//! - Unit tests (`tests/run_unit_tests.sh`)
//! - Coding-style report summary (`coding-style-reports.log`)
//! - Secret scan (gitleaks)
//! - Documentation build and publication (doxide + mkdocs + git)
//!
//! Each step yields a [`StepResult`]; the [`ReportGate`] turns them into a
//! verdict consumed by the notifier.

pub mod config;
mod error;
pub mod fakes;
pub mod gate;
pub mod obs;
pub mod pipeline;
pub mod runner;
pub mod stage;
pub mod steps;
pub mod telemetry;

// Re-export key types
pub use config::{DocsPublishConfig, ReportConfig};
pub use error::ReportError;
pub use gate::{GateVerdict, ReportGate, RunHealth};
pub use pipeline::{ReportPipeline, RunReport};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemCommandRunner};
pub use stage::{format_elapsed, StepKind, StepResult, StepStatus};
pub use telemetry::init_tracing;

/// Result type for ci-report-core operations
pub type Result<T> = std::result::Result<T, ReportError>;
