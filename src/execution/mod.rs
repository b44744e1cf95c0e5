//! Pipeline execution engine

pub mod runner;
pub mod steps;

pub use runner::{PipelineRunner, RunSummary};
pub use steps::{run_llm_step, run_store_step, run_transform_step};
