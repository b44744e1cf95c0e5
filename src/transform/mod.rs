//! Host-populated transform registry
//!
//! Transform steps name callables as `"<registry>:<name>"`. The registry is
//! built at startup, so the set of available transforms is statically
//! auditable; the engine never loads code by string at runtime.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A pure transform: named-argument map in, value or object out
pub type TransformFn = Arc<dyn Fn(&Map<String, Value>) -> anyhow::Result<Value> + Send + Sync>;

/// Registry mapping `(tag, name)` to a callable
#[derive(Clone, Default)]
pub struct TransformRegistry {
    entries: HashMap<(String, String), TransformFn>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the `builtin:` transforms
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("builtin", "word_count", word_count);
        registry.register("builtin", "uppercase", uppercase);
        registry
    }

    /// Register a callable under `(tag, name)`, replacing any previous entry
    pub fn register<F>(&mut self, tag: &str, name: &str, func: F)
    where
        F: Fn(&Map<String, Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.entries
            .insert((tag.to_string(), name.to_string()), Arc::new(func));
    }

    /// Look up a callable
    pub fn get(&self, tag: &str, name: &str) -> Option<&TransformFn> {
        self.entries.get(&(tag.to_string(), name.to_string()))
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self
            .entries
            .keys()
            .map(|(tag, name)| format!("{}:{}", tag, name))
            .collect();
        names.sort();
        f.debug_struct("TransformRegistry")
            .field("transforms", &names)
            .finish()
    }
}

/// `builtin:word_count` - word and character counts for a `text` argument
fn word_count(args: &Map<String, Value>) -> anyhow::Result<Value> {
    let text = string_arg(args, "text")?;
    Ok(json!({
        "words": text.split_whitespace().count(),
        "characters": text.chars().count(),
    }))
}

/// `builtin:uppercase` - scalar uppercased copy of a `text` argument
fn uppercase(args: &Map<String, Value>) -> anyhow::Result<Value> {
    let text = string_arg(args, "text")?;
    Ok(Value::String(text.to_uppercase()))
}

fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> anyhow::Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("expected string argument '{}'", name))
}
