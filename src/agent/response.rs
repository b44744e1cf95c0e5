//! Completion response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response from a completion backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The full completion text
    pub text: String,

    /// Usage statistics reported by the backend (e.g. prompt_tokens,
    /// completion_tokens). Keys are backend-defined.
    #[serde(default)]
    pub usage: Map<String, Value>,
}

impl CompletionResponse {
    /// Create a response with no usage data
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: Map::new(),
        }
    }
}
