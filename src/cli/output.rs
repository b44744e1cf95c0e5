//! CLI output formatting

use crate::core::StepResult;
use crate::persistence::PipelineSummary;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// One-line summary of a completed step
pub fn format_step_result(result: &StepResult) -> String {
    let outputs: Vec<String> = result
        .outputs
        .iter()
        .map(|(key, value)| format!("{}={}", key, format_value(value, 40)))
        .collect();
    format!(
        "{} {} [{}] {}",
        CHECK,
        style(&result.id).green(),
        style(&result.step_type).dim(),
        style(outputs.join(", ")).dim()
    )
}

/// Listing line for one known pipeline
pub fn format_pipeline_summary(summary: &PipelineSummary) -> String {
    let inputs: Vec<String> = summary
        .inputs
        .iter()
        .map(|(name, label)| format!("{}: {}", name, label))
        .collect();
    let mut line = format!(
        "{} ({})",
        style(&summary.name).bold(),
        style(summary.path.display()).dim()
    );
    if !summary.description.is_empty() {
        line.push_str(&format!("\n    {}", summary.description));
    }
    if !inputs.is_empty() {
        line.push_str(&format!(
            "\n    inputs: {}",
            style(inputs.join(", ")).cyan()
        ));
    }
    line
}

fn format_value(value: &serde_json::Value, max_chars: usize) -> String {
    let rendered = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let flat = rendered.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let truncated: String = flat.chars().take(max_chars).collect();
        format!("{}…", truncated)
    }
}
