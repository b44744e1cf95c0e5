//! Run manifest - the durable record of a completed run

use crate::core::EngineError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// The immutable outcome of executing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Step identifier
    pub id: String,

    /// Step type tag ("llm_call", "transform", "store")
    #[serde(rename = "type")]
    pub step_type: String,

    /// Outputs merged into the run context after this step
    pub outputs: Map<String, Value>,

    /// Observability data (e.g. token usage), never referenced by later steps
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl StepResult {
    /// Create a result with empty metadata
    pub fn new(id: &str, step_type: &str, outputs: Map<String, Value>) -> Self {
        Self {
            id: id.to_string(),
            step_type: step_type.to_string(),
            outputs,
            metadata: Map::new(),
        }
    }
}

/// The JSON record written once at the end of a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Unique run identifier
    pub run_id: String,

    /// Name of the pipeline that was run
    pub pipeline: String,

    /// The caller-supplied inputs
    pub inputs: Map<String, Value>,

    /// One entry per executed step, in execution order
    pub steps: Vec<StepResult>,
}

impl RunManifest {
    /// File name of the manifest inside a run directory
    pub const FILE_NAME: &'static str = "run.json";

    /// Serialize the manifest to `<run_dir>/run.json`
    pub fn write(&self, run_dir: &Path) -> Result<PathBuf, EngineError> {
        let path = run_dir.join(Self::FILE_NAME);
        let json = serde_json::to_string_pretty(self)
            .with_context(|| format!("serializing manifest for run {}", self.run_id))?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing manifest to '{}'", path.display()))?;
        Ok(path)
    }

    /// Read a manifest back from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest '{}'", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("parsing manifest '{}'", path.display()))?;
        Ok(manifest)
    }
}
