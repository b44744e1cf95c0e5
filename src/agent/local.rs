//! Deterministic local completion client
//!
//! Produces stable, offline text so pipelines can be exercised without a
//! model backend. Useful for demos and tests; swap in a real
//! [`CompletionClient`](crate::agent::CompletionClient) implementation for
//! actual generation.

use crate::agent::{CompletionClient, CompletionResponse};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// A tiny stub client that echoes the prompt back as a draft
#[derive(Debug, Clone, Default)]
pub struct LocalCompletionClient;

impl LocalCompletionClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionClient for LocalCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        params: &Map<String, Value>,
    ) -> anyhow::Result<CompletionResponse> {
        let temperature = params.get("temperature").cloned().unwrap_or(json!(0.2));
        let max_tokens = params.get("max_tokens").cloned().unwrap_or(json!(512));

        let text = format!(
            "# Local LLM Draft\n{}\n\n---\n_Generated locally with temperature {}, max_tokens {}._",
            prompt.trim(),
            temperature,
            max_tokens
        );

        let mut usage = Map::new();
        usage.insert(
            "prompt_tokens".to_string(),
            json!(prompt.split_whitespace().count()),
        );
        usage.insert(
            "completion_tokens".to_string(),
            json!(text.split_whitespace().count()),
        );

        Ok(CompletionResponse { text, usage })
    }
}
