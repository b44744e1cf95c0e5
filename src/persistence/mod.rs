//! Pipeline discovery and loading from disk
//!
//! Pipelines live as `*.json` files in a base directory and are addressed by
//! name (file stem) or by literal path.

use crate::core::PipelineDefinition;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Listing entry for one known pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub name: String,
    pub path: PathBuf,
    pub description: String,
    pub inputs: IndexMap<String, String>,
}

/// Directory-backed pipeline catalog
#[derive(Debug, Clone)]
pub struct PipelineStore {
    base_dir: PathBuf,
}

impl PipelineStore {
    /// Default pipelines directory relative to the working directory
    pub const DEFAULT_DIR: &'static str = "pipelines";

    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// List all pipeline definitions in the base directory, sorted by path
    pub fn list(&self) -> Result<Vec<PipelineSummary>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.base_dir)
            .with_context(|| format!("reading pipelines dir '{}'", self.base_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut summaries = Vec::with_capacity(paths.len());
        for path in paths {
            let definition = PipelineDefinition::from_file(&path)
                .with_context(|| format!("loading pipeline '{}'", path.display()))?;
            summaries.push(PipelineSummary {
                name: definition.name,
                description: definition.description.unwrap_or_default(),
                inputs: definition.inputs,
                path,
            });
        }
        Ok(summaries)
    }

    /// Load a pipeline by literal path, or by name under the base directory
    pub fn load(&self, name_or_path: &str) -> Result<PipelineDefinition> {
        let direct = Path::new(name_or_path);
        if direct.exists() {
            return Ok(PipelineDefinition::from_file(direct)?);
        }
        let named = self.base_dir.join(format!("{}.json", name_or_path));
        if !named.exists() {
            bail!(
                "pipeline '{}' not found in '{}'",
                name_or_path,
                self.base_dir.display()
            );
        }
        Ok(PipelineDefinition::from_file(named)?)
    }
}
