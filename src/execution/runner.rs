//! Pipeline runner - orchestrates one run from inputs to manifest

use crate::{
    agent::CompletionClient,
    core::{EngineError, PipelineDefinition, RunContext, RunManifest, StepDefinition, StepResult},
    execution::steps::{run_llm_step, run_store_step, run_transform_step},
    prompt::PromptRenderer,
    transform::TransformRegistry,
};
use anyhow::Context;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// What a completed run hands back to the caller
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique run identifier
    pub run_id: String,

    /// Directory holding the run's artifacts and manifest
    pub artifacts_path: PathBuf,

    /// Per-step results in execution order
    pub steps: Vec<StepResult>,
}

/// Executes pipelines: owns the run context for the duration of a run,
/// dispatches each step to its handler in declared order, and writes the
/// manifest on success
///
/// Each call to [`run`](PipelineRunner::run) is an isolated run with a fresh
/// context and its own output directory; the runner itself carries no
/// per-run state and can be reused across runs.
pub struct PipelineRunner<C> {
    artifacts_dir: PathBuf,
    renderer: Box<dyn PromptRenderer>,
    client: C,
    transforms: TransformRegistry,
}

impl<C: CompletionClient> PipelineRunner<C> {
    pub fn new(
        artifacts_dir: impl Into<PathBuf>,
        renderer: Box<dyn PromptRenderer>,
        client: C,
        transforms: TransformRegistry,
    ) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            renderer,
            client,
            transforms,
        }
    }

    /// Directory under which run directories are created
    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Execute a pipeline with the given inputs
    ///
    /// Steps run strictly one after another in declaration order; each step
    /// sees the outputs of every earlier step and nothing else. The first
    /// failing step aborts the run: accumulated results are discarded and no
    /// manifest is written.
    pub async fn run(
        &self,
        pipeline: &PipelineDefinition,
        inputs: Map<String, Value>,
    ) -> Result<RunSummary, EngineError> {
        pipeline.validate()?;

        let run_id = Uuid::new_v4().to_string();
        let run_dir = self.artifacts_dir.join(format!("run-{}", run_id));
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("creating run directory '{}'", run_dir.display()))?;

        info!("Starting run {} of pipeline '{}'", run_id, pipeline.name);

        let mut context = RunContext::new(inputs.clone());
        let mut results: Vec<StepResult> = Vec::with_capacity(pipeline.steps.len());

        for step in &pipeline.steps {
            info!("Executing step: {} ({})", step.id(), step.type_name());
            let result = match step {
                StepDefinition::LlmCall(step) => {
                    run_llm_step(step, &context, self.renderer.as_ref(), &self.client).await?
                }
                StepDefinition::Transform(step) => {
                    run_transform_step(step, &context, &self.transforms)?
                }
                StepDefinition::Store(step) => run_store_step(step, &context, &run_dir)?,
            };
            debug!("Step {} outputs: {:?}", result.id, result.outputs);

            context.record_step(&result.id, result.outputs.clone());
            results.push(result);
        }

        let manifest = RunManifest {
            run_id: run_id.clone(),
            pipeline: pipeline.name.clone(),
            inputs,
            steps: results,
        };
        manifest.write(&run_dir)?;
        info!("Run {} completed with {} steps", run_id, manifest.steps.len());

        Ok(RunSummary {
            run_id,
            artifacts_path: run_dir,
            steps: manifest.steps,
        })
    }
}
