//! promptline - a declarative prompt pipeline runner
//!
//! Pipelines are JSON documents listing steps that render a prompt and
//! obtain a completion, invoke a registered transform, or persist a string
//! to disk. Steps communicate exclusively through a shared run context:
//! later steps reference earlier steps' outputs (and the run's inputs) by
//! dotted-path strings like `draft.post` or `inputs.topic`.

pub mod agent;
pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;
pub mod prompt;
pub mod transform;

// Re-export commonly used types
pub use agent::{CompletionClient, CompletionResponse, LocalCompletionClient};
pub use core::{
    EngineError, PipelineDefinition, RunContext, RunManifest, StepDefinition, StepResult,
};
pub use execution::{PipelineRunner, RunSummary};
pub use persistence::{PipelineStore, PipelineSummary};
pub use prompt::{FileTemplateRenderer, PromptRenderer};
pub use transform::TransformRegistry;
