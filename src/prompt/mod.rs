//! Prompt template rendering collaborator

use anyhow::Context;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Trait for rendering prompt templates - the engine never looks inside
pub trait PromptRenderer: Send + Sync {
    /// Render the referenced template with the given variable set
    fn render(&self, template_ref: &str, variables: &Map<String, Value>) -> anyhow::Result<String>;
}

/// Renders templates stored as files under a templates directory
///
/// Placeholders use the form `{{ dotted.path }}` and are resolved by
/// traversing the variable map; string values are inserted verbatim, other
/// values as compact JSON, and unresolved placeholders render empty.
pub struct FileTemplateRenderer {
    templates_dir: PathBuf,
    placeholder: Regex,
}

impl FileTemplateRenderer {
    /// Create a renderer rooted at the given templates directory
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            // Anything else between braces is left untouched
            placeholder: Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("valid regex"),
        }
    }

    fn substitute(&self, template: &str, variables: &Map<String, Value>) -> String {
        self.placeholder
            .replace_all(template, |caps: &regex::Captures<'_>| {
                lookup(variables, &caps[1])
                    .map(render_value)
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

impl PromptRenderer for FileTemplateRenderer {
    fn render(&self, template_ref: &str, variables: &Map<String, Value>) -> anyhow::Result<String> {
        let path = self.templates_dir.join(template_ref);
        let template = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read template '{}'", path.display()))?;
        Ok(self.substitute(&template, variables))
    }
}

/// Walk a dotted path through the variable map
fn lookup<'a>(variables: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = variables.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
