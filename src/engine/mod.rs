//! Core engine: one generation run from inputs to persisted parlays.

pub mod report;
pub mod runner;

pub use report::{GenerationReport, RunOutcome, TierSummary};
pub use runner::GenerationRunner;
