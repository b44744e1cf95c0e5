//! Completion client collaborator
//!
//! The engine treats the language model as a black box behind
//! [`CompletionClient`]: rendered prompt and generation parameters in,
//! completion text and usage stats out.

pub mod local;
pub mod response;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use local::LocalCompletionClient;
pub use response::CompletionResponse;

/// Trait for obtaining completions - allows for different backends
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Obtain a completion for a rendered prompt
    ///
    /// `params` carries the step's generation parameters (temperature,
    /// max_tokens, ...) verbatim; interpretation is up to the backend.
    async fn complete(
        &self,
        prompt: &str,
        params: &Map<String, Value>,
    ) -> anyhow::Result<CompletionResponse>;
}
