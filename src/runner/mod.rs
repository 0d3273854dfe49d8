//! Step graph execution and reporting.

pub mod executor;
pub mod report;

pub use executor::{run, run_with_progress, Execution, RunProgress, DRY_RUN_REASON};
pub use report::{TestCase, TestSuite};
