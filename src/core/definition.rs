//! Pipeline definition loaded from JSON

use crate::core::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A declarative pipeline: named, with advisory input labels and an ordered
/// list of steps
///
/// Step order is significant and fixed at load time; the engine executes
/// steps exactly in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline name
    pub name: String,

    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Declared inputs (name -> type label). Advisory only: the engine does
    /// not validate caller-supplied inputs against these labels.
    #[serde(default)]
    pub inputs: IndexMap<String, String>,

    /// Ordered pipeline steps
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

/// One step in a pipeline, tagged by type
///
/// Adding a step type means adding a variant here and a handler for it; the
/// runner matches exhaustively, so the compiler flags any missing dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDefinition {
    /// Render a prompt template and obtain a completion
    LlmCall(LlmCallStep),
    /// Invoke a registered transform callable
    Transform(TransformStep),
    /// Persist a resolved string to the run directory
    Store(StoreStep),
}

/// An `llm_call` step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallStep {
    /// Unique step identifier
    pub id: String,

    /// Template reference passed to the prompt renderer
    pub prompt: String,

    /// Generation parameters forwarded to the completion client
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Extra render variables overlaid on the run context (step-local wins)
    #[serde(default)]
    pub vars: Map<String, Value>,

    /// Output mappings (target key -> source spec). A source spec is either
    /// "content" (the full completion text) or "metadata.<key>" (a usage
    /// field).
    #[serde(default = "default_llm_outputs")]
    pub outputs: IndexMap<String, String>,
}

/// A `transform` step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformStep {
    /// Unique step identifier
    pub id: String,

    /// Callable reference in the form "<registry>:<name>"
    pub code: String,

    /// Named arguments (argument name -> context reference)
    #[serde(default)]
    pub inputs: IndexMap<String, String>,

    /// Output names. Only consulted when the callable returns a scalar, in
    /// which case exactly one key must be declared.
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
}

/// A `store` step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStep {
    /// Unique step identifier
    pub id: String,

    /// Values to resolve (local name -> context reference)
    #[serde(default)]
    pub inputs: IndexMap<String, String>,

    /// Target filename inside the run directory. Defaults to "<id>.md".
    #[serde(default)]
    pub filename: Option<String>,

    /// Which resolved input holds the file content. Defaults to the first
    /// declared input.
    #[serde(default)]
    pub content_key: Option<String>,
}

fn default_llm_outputs() -> IndexMap<String, String> {
    let mut outputs = IndexMap::new();
    outputs.insert("content".to_string(), "content".to_string());
    outputs
}

impl StepDefinition {
    /// The step's unique identifier
    pub fn id(&self) -> &str {
        match self {
            StepDefinition::LlmCall(step) => &step.id,
            StepDefinition::Transform(step) => &step.id,
            StepDefinition::Store(step) => &step.id,
        }
    }

    /// The step's type tag as it appears in pipeline JSON
    pub fn type_name(&self) -> &'static str {
        match self {
            StepDefinition::LlmCall(_) => "llm_call",
            StepDefinition::Transform(_) => "transform",
            StepDefinition::Store(_) => "store",
        }
    }
}

impl PipelineDefinition {
    /// Load a pipeline definition from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Definition(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a pipeline definition from a JSON string
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let definition: PipelineDefinition =
            serde_json::from_str(json).map_err(|e| EngineError::Definition(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Validate the definition: step ids must be unique
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen_ids = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen_ids.insert(step.id()) {
                return Err(EngineError::Definition(format!(
                    "duplicate step id: {}",
                    step.id()
                )));
            }
        }
        Ok(())
    }
}
