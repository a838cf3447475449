//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Actionflow - declarative task orchestration.
#[derive(Debug, Parser)]
#[command(name = "actionflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true, env = "AF_DEBUG", value_parser = clap::builder::FalseyValueParser::new())]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load and execute a flow
    Run(RunArgs),

    /// Load a flow without executing it
    Validate(ValidateArgs),

    /// List available actions
    Actions,

    /// Show the tail of the log file
    Logs(LogsArgs),

    /// Report whether a run is in progress
    Status,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Flow document to run
    pub file: PathBuf,

    /// Show attempts and errors per action
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    /// Flow document to validate
    pub file: PathBuf,
}

/// Arguments for the `logs` command.
#[derive(Debug, Clone, clap::Args)]
pub struct LogsArgs {
    /// Number of lines to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub lines: usize,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
