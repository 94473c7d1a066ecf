//! Stackform - typed infrastructure stacks synthesized to Terraform JSON
//!
//! This is the main entry point for the Stackform CLI.

mod cli;

use anyhow::Result;
use cli::commands::{CommandContext, Runnable};
use cli::Cli;
use stackform::config::{Config, LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code for any failure while loading configuration
const CONFIG_EXIT_CODE: i32 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.verbosity(), &LoggingConfig::default());
            let output = cli::output::OutputFormatter::new(!cli.no_color, cli.is_json(), 0);
            output.error(&format!("Failed to load config: {}", e));
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    // Initialize logging based on verbosity and config
    init_logging(cli.verbosity(), &config.logging);

    tracing::debug!(build = %stackform::version_info(), "starting");

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let exit_code = match cli.command.run(&mut ctx).await {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            exit_code_for(&e)
        }
    };

    ctx.output.flush();
    std::process::exit(exit_code);
}

/// Map a command error to a process exit code
fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<stackform::Error>()
        .map_or(1, stackform::Error::exit_code)
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, logging: &LoggingConfig) {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| EnvFilter::try_new(filter).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(verbosity >= 3)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}
