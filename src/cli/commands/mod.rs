//! Subcommands module for Stackform CLI
//!
//! This module contains all the subcommand implementations.

pub mod graph;
pub mod list;
pub mod outputs;
pub mod synth;
pub mod validate;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use stackform::blueprint::build_stack;
use stackform::config::Config;
use stackform::stack::Stack;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Stack name override from `--stack`
    pub stack_name: Option<String>,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.colors.enabled;
        let output = OutputFormatter::new(use_color, cli.is_json(), cli.verbosity());

        Self {
            config,
            output,
            stack_name: cli.stack.clone(),
        }
    }

    /// Get the effective stack name
    pub fn stack_name(&self) -> &str {
        self.stack_name
            .as_deref()
            .unwrap_or(self.config.stack.name.as_str())
    }

    /// Declare the stack from the configured settings
    pub fn build_stack(&self) -> Result<Stack> {
        let name = self.stack_name();
        self.output.debug(&format!("Declaring stack '{}'", name));
        Ok(build_stack(name, &self.config.stack.settings)?)
    }
}

/// Trait for runnable commands
#[async_trait::async_trait]
pub trait Runnable {
    /// Execute the command
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32>;
}

#[async_trait::async_trait]
impl Runnable for crate::cli::Commands {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        use crate::cli::Commands;

        match self {
            Commands::Synth(args) => args.execute(ctx).await,
            Commands::Validate(args) => args.execute(ctx).await,
            Commands::List(args) => args.execute(ctx).await,
            Commands::Graph(args) => args.execute(ctx).await,
            Commands::Outputs(args) => args.execute(ctx).await,
            Commands::Completions(args) => args.execute(ctx).await,
        }
    }
}
