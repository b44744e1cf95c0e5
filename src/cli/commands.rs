//! CLI command definitions

use clap::Args;

/// Run a pipeline with the provided inputs
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Pipeline name or path to a pipeline JSON file
    pub pipeline: String,

    /// Input parameter (key=value), repeatable
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,

    /// Directory containing pipeline definitions
    #[arg(long, default_value = "pipelines")]
    pub pipelines_dir: String,

    /// Directory containing prompt templates
    #[arg(long, default_value = "templates")]
    pub templates_dir: String,

    /// Directory to write run artifacts into
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: String,
}

/// List available pipelines
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Directory containing pipeline definitions
    #[arg(long, default_value = "pipelines")]
    pub pipelines_dir: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline JSON file
    #[arg(short, long)]
    pub file: String,
}

/// Show the manifest of a completed run
#[derive(Debug, Args, Clone)]
pub struct ShowCommand {
    /// Run identifier
    pub run_id: String,

    /// Directory holding run artifacts
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: String,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
