//! Engine error taxonomy

use thiserror::Error;

/// Errors surfaced by the pipeline engine
///
/// None of these are retried or locally recovered: any error raised while a
/// step is executing aborts the run, and the triggering error reaches the
/// caller unchanged.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed pipeline definition (unknown step type, duplicate step ids, bad JSON)
    #[error("invalid pipeline definition: {0}")]
    Definition(String),

    /// Dangling or malformed dotted-path reference
    #[error("cannot resolve reference '{reference}': {reason}")]
    Reference { reference: String, reason: String },

    /// A step declaration that parses but cannot be executed as written
    #[error("step '{step_id}' is misconfigured: {reason}")]
    Configuration { step_id: String, reason: String },

    /// Failure inside a collaborator: template renderer, completion client,
    /// registered transform, or filesystem I/O
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl EngineError {
    /// Shorthand for a reference failure
    pub fn reference(reference: &str, reason: impl Into<String>) -> Self {
        EngineError::Reference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a step configuration failure
    pub fn configuration(step_id: &str, reason: impl Into<String>) -> Self {
        EngineError::Configuration {
            step_id: step_id.to_string(),
            reason: reason.into(),
        }
    }
}
