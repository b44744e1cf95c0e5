//! Step handlers - one per step type
//!
//! Each handler reads the run context and its own definition, talks to its
//! collaborators, and returns a fresh [`StepResult`]. Handlers never mutate
//! the context; only the runner merges outputs back in.

use crate::{
    agent::CompletionClient,
    core::{EngineError, LlmCallStep, RunContext, StepResult, StoreStep, TransformStep},
    prompt::PromptRenderer,
    transform::TransformRegistry,
};
use anyhow::Context;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Execute an `llm_call` step: render the prompt, obtain a completion, and
/// map the declared outputs
pub async fn run_llm_step(
    step: &LlmCallStep,
    context: &RunContext,
    renderer: &dyn PromptRenderer,
    client: &dyn CompletionClient,
) -> Result<StepResult, EngineError> {
    // Step-local vars take precedence over context variables on collision
    let mut variables = context.render_variables();
    for (key, value) in &step.vars {
        variables.insert(key.clone(), value.clone());
    }

    let prompt = renderer
        .render(&step.prompt, &variables)
        .with_context(|| format!("rendering template '{}' for step '{}'", step.prompt, step.id))?;
    debug!("Rendered prompt for step {}: {}", step.id, prompt);

    let response = client
        .complete(&prompt, &step.params)
        .await
        .with_context(|| format!("completion failed for step '{}'", step.id))?;

    let mut outputs = Map::new();
    for (target, source) in &step.outputs {
        if source == "content" {
            outputs.insert(target.clone(), Value::String(response.text.clone()));
        } else if let Some(key) = source.strip_prefix("metadata.") {
            outputs.insert(
                target.clone(),
                response.usage.get(key).cloned().unwrap_or(Value::Null),
            );
        } else {
            return Err(EngineError::configuration(
                &step.id,
                format!("unsupported output source '{}'", source),
            ));
        }
    }

    // Full usage goes into metadata regardless of which fields were mapped
    let mut metadata = Map::new();
    metadata.insert("usage".to_string(), Value::Object(response.usage));

    Ok(StepResult {
        id: step.id.clone(),
        step_type: "llm_call".to_string(),
        outputs,
        metadata,
    })
}

/// Execute a `transform` step: resolve the arguments and invoke the
/// registered callable
pub fn run_transform_step(
    step: &TransformStep,
    context: &RunContext,
    transforms: &TransformRegistry,
) -> Result<StepResult, EngineError> {
    let (tag, name) = step
        .code
        .split_once(':')
        .filter(|(tag, name)| !tag.is_empty() && !name.is_empty())
        .ok_or_else(|| {
            EngineError::configuration(
                &step.id,
                format!(
                    "transform code must be '<registry>:<name>', got '{}'",
                    step.code
                ),
            )
        })?;

    let func = transforms.get(tag, name).ok_or_else(|| {
        EngineError::configuration(&step.id, format!("no transform registered as '{}'", step.code))
    })?;

    let args = context.resolve_inputs(&step.inputs)?;
    let value = func(&args)
        .with_context(|| format!("transform '{}' failed in step '{}'", step.code, step.id))?;

    let outputs = match value {
        // An object becomes the outputs verbatim
        Value::Object(map) => map,
        scalar => {
            if step.outputs.len() != 1 {
                return Err(EngineError::configuration(
                    &step.id,
                    format!(
                        "transform returned a scalar but {} output keys are declared; \
                         declare exactly one",
                        step.outputs.len()
                    ),
                ));
            }
            let key = step.outputs.keys().next().cloned().expect("one key");
            let mut outputs = Map::new();
            outputs.insert(key, scalar);
            outputs
        }
    };

    Ok(StepResult::new(&step.id, "transform", outputs))
}

/// Execute a `store` step: resolve the inputs and write the content string
/// into the run directory
pub fn run_store_step(
    step: &StoreStep,
    context: &RunContext,
    run_dir: &Path,
) -> Result<StepResult, EngineError> {
    let resolved = context.resolve_inputs(&step.inputs)?;

    let content_key = match &step.content_key {
        Some(key) => key.clone(),
        // Default: first declared input, in declaration order
        None => resolved.keys().next().cloned().ok_or_else(|| {
            EngineError::configuration(&step.id, "store step declares no inputs")
        })?,
    };

    let content = resolved
        .get(&content_key)
        .ok_or_else(|| {
            EngineError::configuration(
                &step.id,
                format!("content_key '{}' is not among the resolved inputs", content_key),
            )
        })?
        .as_str()
        .ok_or_else(|| {
            EngineError::configuration(
                &step.id,
                format!("store content at '{}' must be a string", content_key),
            )
        })?;

    let filename = step
        .filename
        .clone()
        .unwrap_or_else(|| format!("{}.md", step.id));
    let path = run_dir.join(&filename);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating '{}'", parent.display()))?;
    }
    std::fs::write(&path, content).with_context(|| format!("writing '{}'", path.display()))?;
    let absolute = std::fs::canonicalize(&path)
        .with_context(|| format!("resolving '{}'", path.display()))?;

    let mut outputs = Map::new();
    outputs.insert(
        "path".to_string(),
        Value::String(absolute.display().to_string()),
    );
    Ok(StepResult::new(&step.id, "store", outputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::CompletionResponse;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use serde_json::json;

    /// Renderer that returns the variable set as JSON, making overlay
    /// behavior observable in the "rendered" prompt
    struct VariableDumpRenderer;

    impl PromptRenderer for VariableDumpRenderer {
        fn render(
            &self,
            _template_ref: &str,
            variables: &Map<String, Value>,
        ) -> anyhow::Result<String> {
            Ok(serde_json::to_string(variables)?)
        }
    }

    struct FailingRenderer;

    impl PromptRenderer for FailingRenderer {
        fn render(&self, _t: &str, _v: &Map<String, Value>) -> anyhow::Result<String> {
            anyhow::bail!("template not found")
        }
    }

    /// Client returning a fixed response
    struct FixedClient {
        text: String,
        usage: Map<String, Value>,
    }

    impl FixedClient {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                usage: json!({"prompt_tokens": 4, "completion_tokens": 9})
                    .as_object()
                    .unwrap()
                    .clone(),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(
            &self,
            _prompt: &str,
            _params: &Map<String, Value>,
        ) -> anyhow::Result<CompletionResponse> {
            Ok(CompletionResponse {
                text: self.text.clone(),
                usage: self.usage.clone(),
            })
        }
    }

    fn context_with_inputs(inputs: Value) -> RunContext {
        RunContext::new(inputs.as_object().unwrap().clone())
    }

    fn llm_step(outputs: &[(&str, &str)]) -> LlmCallStep {
        LlmCallStep {
            id: "gen".to_string(),
            prompt: "gen.tmpl".to_string(),
            params: Map::new(),
            vars: Map::new(),
            outputs: outputs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn refs(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_llm_content_and_metadata_outputs() {
        let ctx = context_with_inputs(json!({"topic": "tea"}));
        let step = llm_step(&[("post", "content"), ("tokens", "metadata.completion_tokens")]);
        let client = FixedClient::new("the full draft");

        let result = run_llm_step(&step, &ctx, &VariableDumpRenderer, &client)
            .await
            .unwrap();

        assert_eq!(result.step_type, "llm_call");
        assert_eq!(result.outputs["post"], json!("the full draft"));
        assert_eq!(result.outputs["tokens"], json!(9));
        // Full usage is preserved in metadata either way
        assert_eq!(result.metadata["usage"]["prompt_tokens"], json!(4));
    }

    #[tokio::test]
    async fn test_llm_missing_usage_key_maps_to_null() {
        let ctx = context_with_inputs(json!({}));
        let step = llm_step(&[("cost", "metadata.billed_cents")]);
        let client = FixedClient::new("text");

        let result = run_llm_step(&step, &ctx, &VariableDumpRenderer, &client)
            .await
            .unwrap();
        assert_eq!(result.outputs["cost"], Value::Null);
    }

    #[tokio::test]
    async fn test_llm_unsupported_output_source() {
        let ctx = context_with_inputs(json!({}));
        let step = llm_step(&[("x", "raw_response")]);
        let client = FixedClient::new("text");

        let err = run_llm_step(&step, &ctx, &VariableDumpRenderer, &client)
            .await
            .unwrap_err();
        match err {
            EngineError::Configuration { reason, .. } => {
                assert!(reason.contains("unsupported output source"))
            }
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_llm_step_vars_override_context() {
        let mut ctx = context_with_inputs(json!({"topic": "tea"}));
        ctx.record_step("draft", json!({"post": "v1"}).as_object().unwrap().clone());

        let mut step = llm_step(&[("echo", "content")]);
        step.vars = json!({"draft": "overridden"}).as_object().unwrap().clone();
        let client = FixedClient::new("ok");

        // The dump renderer exposes the variables the template would see
        let variables = {
            let mut vars = ctx.render_variables();
            for (k, v) in &step.vars {
                vars.insert(k.clone(), v.clone());
            }
            vars
        };
        assert_eq!(variables["draft"], json!("overridden"));
        assert_eq!(variables["inputs"]["topic"], json!("tea"));

        let result = run_llm_step(&step, &ctx, &VariableDumpRenderer, &client)
            .await
            .unwrap();
        assert_eq!(result.outputs["echo"], json!("ok"));
    }

    #[tokio::test]
    async fn test_llm_renderer_failure_is_external() {
        let ctx = context_with_inputs(json!({}));
        let step = llm_step(&[("post", "content")]);
        let client = FixedClient::new("unused");

        let err = run_llm_step(&step, &ctx, &FailingRenderer, &client)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::External(_)), "got {:?}", err);
    }

    #[test]
    fn test_transform_object_return_passes_through() {
        let ctx = context_with_inputs(json!({"text": "a b c"}));
        let mut registry = TransformRegistry::new();
        registry.register("demo", "stats", |args| {
            let text = args["text"].as_str().unwrap();
            Ok(json!({"words": text.split_whitespace().count(), "raw": text}))
        });

        let step = TransformStep {
            id: "stats".to_string(),
            code: "demo:stats".to_string(),
            inputs: refs(&[("text", "inputs.text")]),
            outputs: IndexMap::new(),
        };

        let result = run_transform_step(&step, &ctx, &registry).unwrap();
        assert_eq!(result.step_type, "transform");
        assert_eq!(result.outputs["words"], json!(3));
        assert_eq!(result.outputs["raw"], json!("a b c"));
        assert_eq!(result.outputs.len(), 2);
    }

    #[test]
    fn test_transform_scalar_assigned_to_single_output() {
        let ctx = context_with_inputs(json!({"n": 21}));
        let mut registry = TransformRegistry::new();
        registry.register("demo", "double", |args| {
            Ok(json!(args["n"].as_i64().unwrap() * 2))
        });

        let step = TransformStep {
            id: "double".to_string(),
            code: "demo:double".to_string(),
            inputs: refs(&[("n", "inputs.n")]),
            outputs: refs(&[("result", "number")]),
        };

        let result = run_transform_step(&step, &ctx, &registry).unwrap();
        assert_eq!(result.outputs["result"], json!(42));
    }

    #[test]
    fn test_transform_scalar_with_two_outputs_is_ambiguous() {
        let ctx = context_with_inputs(json!({}));
        let mut registry = TransformRegistry::new();
        registry.register("demo", "one", |_| Ok(json!(1)));

        let step = TransformStep {
            id: "bad".to_string(),
            code: "demo:one".to_string(),
            inputs: IndexMap::new(),
            outputs: refs(&[("a", "x"), ("b", "y")]),
        };

        let err = run_transform_step(&step, &ctx, &registry).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }), "got {:?}", err);
    }

    #[test]
    fn test_transform_scalar_with_zero_outputs_is_ambiguous() {
        let ctx = context_with_inputs(json!({}));
        let mut registry = TransformRegistry::new();
        registry.register("demo", "one", |_| Ok(json!(1)));

        let step = TransformStep {
            id: "bad".to_string(),
            code: "demo:one".to_string(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
        };

        let err = run_transform_step(&step, &ctx, &registry).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[test]
    fn test_transform_malformed_code() {
        let ctx = context_with_inputs(json!({}));
        let registry = TransformRegistry::new();

        for code in ["no_colon", ":name_only", "tag_only:", ""] {
            let step = TransformStep {
                id: "bad".to_string(),
                code: code.to_string(),
                inputs: IndexMap::new(),
                outputs: IndexMap::new(),
            };
            let err = run_transform_step(&step, &ctx, &registry).unwrap_err();
            assert!(
                matches!(err, EngineError::Configuration { .. }),
                "code '{}' should be rejected, got {:?}",
                code,
                err
            );
        }
    }

    #[test]
    fn test_transform_unregistered_callable() {
        let ctx = context_with_inputs(json!({}));
        let registry = TransformRegistry::new();
        let step = TransformStep {
            id: "bad".to_string(),
            code: "nowhere:nothing".to_string(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
        };

        let err = run_transform_step(&step, &ctx, &registry).unwrap_err();
        match err {
            EngineError::Configuration { reason, .. } => {
                assert!(reason.contains("nowhere:nothing"))
            }
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_transform_callable_error_is_external() {
        let ctx = context_with_inputs(json!({}));
        let mut registry = TransformRegistry::new();
        registry.register("demo", "boom", |_| anyhow::bail!("exploded"));

        let step = TransformStep {
            id: "boom".to_string(),
            code: "demo:boom".to_string(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
        };

        let err = run_transform_step(&step, &ctx, &registry).unwrap_err();
        assert!(matches!(err, EngineError::External(_)), "got {:?}", err);
    }

    #[test]
    fn test_store_writes_content_and_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_inputs(json!({"msg": "hello"}));

        let step = StoreStep {
            id: "keep".to_string(),
            inputs: refs(&[("text", "inputs.msg")]),
            filename: Some("out.md".to_string()),
            content_key: None,
        };

        let result = run_store_step(&step, &ctx, dir.path()).unwrap();
        let path = result.outputs["path"].as_str().unwrap();
        assert!(path.ends_with("out.md"), "got path {}", path);
        assert_eq!(std::fs::read_to_string(dir.path().join("out.md")).unwrap(), "hello");
    }

    #[test]
    fn test_store_default_filename_is_step_id() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_inputs(json!({"msg": "hi"}));

        let step = StoreStep {
            id: "keep".to_string(),
            inputs: refs(&[("text", "inputs.msg")]),
            filename: None,
            content_key: None,
        };

        run_store_step(&step, &ctx, dir.path()).unwrap();
        assert!(dir.path().join("keep.md").exists());
    }

    #[test]
    fn test_store_default_content_key_is_first_declared() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_inputs(json!({"first": "chosen", "second": "ignored"}));

        let step = StoreStep {
            id: "keep".to_string(),
            inputs: refs(&[("alpha", "inputs.first"), ("beta", "inputs.second")]),
            filename: None,
            content_key: None,
        };

        run_store_step(&step, &ctx, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("keep.md")).unwrap(),
            "chosen"
        );
    }

    #[test]
    fn test_store_explicit_content_key() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_inputs(json!({"first": "ignored", "second": "chosen"}));

        let step = StoreStep {
            id: "keep".to_string(),
            inputs: refs(&[("alpha", "inputs.first"), ("beta", "inputs.second")]),
            filename: None,
            content_key: Some("beta".to_string()),
        };

        run_store_step(&step, &ctx, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("keep.md")).unwrap(),
            "chosen"
        );
    }

    #[test]
    fn test_store_non_string_content_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_inputs(json!({"n": 42}));

        let step = StoreStep {
            id: "keep".to_string(),
            inputs: refs(&[("n", "inputs.n")]),
            filename: None,
            content_key: None,
        };

        let err = run_store_step(&step, &ctx, dir.path()).unwrap_err();
        match err {
            EngineError::Configuration { reason, .. } => {
                assert!(reason.contains("must be a string"))
            }
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_store_without_inputs_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_inputs(json!({}));

        let step = StoreStep {
            id: "keep".to_string(),
            inputs: IndexMap::new(),
            filename: None,
            content_key: None,
        };

        let err = run_store_step(&step, &ctx, dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[test]
    fn test_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_inputs(json!({"msg": "nested"}));

        let step = StoreStep {
            id: "keep".to_string(),
            inputs: refs(&[("text", "inputs.msg")]),
            filename: Some("drafts/final/out.md".to_string()),
            content_key: None,
        };

        run_store_step(&step, &ctx, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("drafts/final/out.md")).unwrap(),
            "nested"
        );
    }
}
