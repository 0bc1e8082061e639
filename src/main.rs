//! deltagen - Partial Update Artifact Builder
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use deltagen::cli::{Cli, Commands};
use deltagen::config::ConfigManager;
use deltagen::error::DeltagenResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DeltagenResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("deltagen=warn"),
        1 => EnvFilter::new("deltagen=info"),
        _ => EnvFilter::new("deltagen=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Ensure state directories exist
    ConfigManager::ensure_state_dirs(&config).await?;

    // Dispatch to command
    match cli.command {
        Commands::Build(args) => deltagen::cli::commands::build(args, &config).await,
        Commands::Cache(args) => deltagen::cli::commands::cache(args, &config).await,
        Commands::Status => deltagen::cli::commands::status(&config).await,
        Commands::Config(args) => {
            deltagen::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
