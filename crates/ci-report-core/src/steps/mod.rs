//! The report steps. Each wraps one external tool and produces a [`StepResult`].
//!
//! [`StepResult`]: crate::stage::StepResult

pub mod coding_style;
pub mod compilation;
pub mod documentation;
pub mod secret_scan;

pub use coding_style::{run_coding_style, LintFinding, LintSummary, Severity};
pub use compilation::run_compilation;
pub use documentation::{build_site, publish_site, run_documentation, SiteBuild, SiteMetadata};
pub use secret_scan::run_secret_scan;
pub use unit_tests::run_unit_tests;
