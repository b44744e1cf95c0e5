//! Run context and dotted-path reference resolution

use crate::core::EngineError;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Live state of one pipeline run
///
/// Holds the caller-supplied inputs (immutable for the run) and the outputs
/// of every completed step, keyed by step id in execution order. The runner
/// is the sole mutator; step handlers only read it.
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    inputs: Value,
    steps: Map<String, Value>,
}

impl RunContext {
    /// Create a context seeded with the run's inputs
    pub fn new(inputs: Map<String, Value>) -> Self {
        Self {
            inputs: Value::Object(inputs),
            steps: Map::new(),
        }
    }

    /// The run's input map
    pub fn inputs(&self) -> &Map<String, Value> {
        // Constructed as an object in new(), never reassigned
        self.inputs.as_object().expect("inputs is an object")
    }

    /// Record a completed step's outputs. Called by the runner only.
    pub fn record_step(&mut self, step_id: &str, outputs: Map<String, Value>) {
        self.steps.insert(step_id.to_string(), Value::Object(outputs));
    }

    /// Resolve a dotted-path reference against this context
    ///
    /// The first segment is either the literal `inputs` or the id of a step
    /// that has already run. Each later segment is a key lookup in an object
    /// or a non-negative index into an array. The same literal is a key
    /// against an object and an index against an array; there is no coercion
    /// across container kinds.
    pub fn resolve(&self, reference: &str) -> Result<Value, EngineError> {
        let mut segments = reference.split('.');
        let head = segments.next().unwrap_or("");

        let mut current = if head == "inputs" {
            &self.inputs
        } else {
            self.steps.get(head).ok_or_else(|| {
                EngineError::reference(
                    reference,
                    format!("'{}' is neither 'inputs' nor a completed step id", head),
                )
            })?
        };

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment).ok_or_else(|| {
                    EngineError::reference(reference, format!("no key '{}'", segment))
                })?,
                Value::Array(items) => {
                    let index: usize = segment.parse().map_err(|_| {
                        EngineError::reference(
                            reference,
                            format!("'{}' is not a valid array index", segment),
                        )
                    })?;
                    items.get(index).ok_or_else(|| {
                        EngineError::reference(
                            reference,
                            format!("index {} out of bounds (len {})", index, items.len()),
                        )
                    })?
                }
                _ => {
                    return Err(EngineError::reference(
                        reference,
                        format!("cannot traverse into scalar at '{}'", segment),
                    ))
                }
            };
        }

        Ok(current.clone())
    }

    /// Resolve a map of named references in declaration order
    pub fn resolve_inputs(
        &self,
        mappings: &IndexMap<String, String>,
    ) -> Result<Map<String, Value>, EngineError> {
        let mut resolved = Map::new();
        for (name, reference) in mappings {
            resolved.insert(name.clone(), self.resolve(reference)?);
        }
        Ok(resolved)
    }

    /// Variables visible to a prompt template: the inputs under `inputs`,
    /// plus each completed step's outputs under its step id
    pub fn render_variables(&self) -> Map<String, Value> {
        let mut variables = Map::new();
        variables.insert("inputs".to_string(), self.inputs.clone());
        for (step_id, outputs) in &self.steps {
            variables.insert(step_id.clone(), outputs.clone());
        }
        variables
    }
}
