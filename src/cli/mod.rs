//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{ListCommand, RunCommand, ShowCommand, ValidateCommand};

/// Declarative prompt pipeline runner
#[derive(Debug, Parser, Clone)]
#[command(name = "promptline")]
#[command(author = "Promptline Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A declarative prompt pipeline runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline with the provided inputs
    Run(RunCommand),

    /// List available pipelines
    List(ListCommand),

    /// Validate a pipeline definition
    Validate(ValidateCommand),

    /// Show the manifest of a completed run
    Show(ShowCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
