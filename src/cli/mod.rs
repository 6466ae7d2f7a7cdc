//! Command-line interface

pub mod commands;
pub mod output;
pub mod terminal_output;

use clap::{Parser, Subcommand};
use commands::{DetectCommand, ListCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Run CI pipelines on your own machine
#[derive(Debug, Parser, Clone)]
#[command(name = "localci")]
#[command(author = "localci Contributors")]
#[command(version = "0.1.0")]
#[command(
    about = "Run GitHub Actions, Azure DevOps and CodeMagic pipelines locally",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging and show output of failed steps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Stream step output to the terminal instead of capturing it
    #[arg(short, long, global = true)]
    pub stream: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline
    Run(RunCommand),

    /// Validate a pipeline and show what would run
    Validate(ValidateCommand),

    /// Detect the CI system of pipeline files
    Detect(DetectCommand),

    /// List pipelines and their workflows
    List(ListCommand),
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
