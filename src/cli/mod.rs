//! CLI module for Stackform
//!
//! This module provides the command-line interface for Stackform,
//! including argument parsing and subcommand handling.

pub mod commands;
pub mod completions;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stackform - typed infrastructure stacks for Terraform
///
/// Declares the stack, checks it, and synthesizes Terraform JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "stackform")]
#[command(version)]
#[command(about = "Typed infrastructure stacks synthesized to Terraform JSON", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "STACKFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Stack name (overrides the configured name)
    #[arg(long, global = true)]
    pub stack: Option<String>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check the stack and write Terraform JSON
    Synth(commands::synth::SynthArgs),

    /// Run the stack checks and report findings
    Validate(commands::validate::ValidateArgs),

    /// List declarations in declaration order
    List(commands::list::ListArgs),

    /// Show the dependency graph
    Graph(commands::graph::GraphArgs),

    /// Show the stack outputs
    Outputs(commands::outputs::OutputsArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}
