pub mod runner;
pub mod stats;

pub use runner::{PipelineRunner, RunReport, TermOutcome};
pub use stats::RunStats;
