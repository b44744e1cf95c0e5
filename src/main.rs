use anyhow::{Context, Result};
use promptline::agent::LocalCompletionClient;
use promptline::cli::commands::{ListCommand, RunCommand, ShowCommand, ValidateCommand};
use promptline::cli::output::*;
use promptline::cli::{Cli, Command};
use promptline::core::{PipelineDefinition, RunManifest};
use promptline::execution::PipelineRunner;
use promptline::persistence::PipelineStore;
use promptline::prompt::FileTemplateRenderer;
use promptline::transform::TransformRegistry;
use serde_json::{Map, Value};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::List(cmd) => list_pipelines(cmd)?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Show(cmd) => show_manifest(cmd)?,
    }

    Ok(())
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let store = PipelineStore::new(&cmd.pipelines_dir);
    let pipeline = store
        .load(&cmd.pipeline)
        .context("Failed to load pipeline")?;

    println!(
        "{} Loaded pipeline: {}",
        INFO,
        style(&pipeline.name).bold()
    );

    let mut inputs: Map<String, Value> = Map::new();
    for (key, value) in &cmd.param {
        inputs.insert(key.clone(), Value::String(value.clone()));
    }

    let runner = PipelineRunner::new(
        &cmd.artifacts_dir,
        Box::new(FileTemplateRenderer::new(&cmd.templates_dir)),
        LocalCompletionClient::new(),
        TransformRegistry::with_builtins(),
    );

    println!("{} Running {} steps", ROCKET, style(pipeline.steps.len()).cyan());
    match runner.run(&pipeline, inputs).await {
        Ok(summary) => {
            for result in &summary.steps {
                println!("{}", format_step_result(result));
            }
            println!(
                "\n{} {} completed {}",
                CHECK,
                style(&pipeline.name).bold(),
                style("successfully").green()
            );
            println!("  Run ID:    {}", style(&summary.run_id).cyan());
            println!(
                "  Artifacts: {}",
                style(summary.artifacts_path.display()).dim()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {}: {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red(),
                e
            );
            std::process::exit(1);
        }
    }
}

fn list_pipelines(cmd: &ListCommand) -> Result<()> {
    let store = PipelineStore::new(&cmd.pipelines_dir);
    let pipelines = store.list()?;

    if pipelines.is_empty() {
        println!(
            "{} No pipelines found in '{}'",
            INFO, cmd.pipelines_dir
        );
        return Ok(());
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&pipelines)?);
        return Ok(());
    }

    println!("{} Available pipelines:", INFO);
    for summary in &pipelines {
        println!("- {}", format_pipeline_summary(summary));
    }
    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineDefinition::from_file(&cmd.file) {
        Ok(pipeline) => {
            println!("{} Pipeline definition is valid!", CHECK);
            println!("  Name: {}", style(&pipeline.name).bold());
            println!("  Steps: {}", style(pipeline.steps.len()).cyan());
            println!("  Inputs: {}", style(pipeline.inputs.len()).cyan());
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn show_manifest(cmd: &ShowCommand) -> Result<()> {
    let path = std::path::Path::new(&cmd.artifacts_dir)
        .join(format!("run-{}", cmd.run_id))
        .join(RunManifest::FILE_NAME);
    if !path.exists() {
        println!("{} Run '{}' not found", CROSS, cmd.run_id);
        std::process::exit(1);
    }

    let manifest = RunManifest::from_file(&path)?;
    println!("{} Run {}", INFO, style(&manifest.run_id).cyan());
    println!("  Pipeline: {}", style(&manifest.pipeline).bold());
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}
