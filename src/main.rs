//! websessions - Flat-file web session cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use websessions::cli::{commands, Cli, Commands, Context};
use websessions::config::{Config, ConfigManager};
use websessions::error::WebSessionResult;

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

async fn run() -> WebSessionResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    let cache_dir = cli
        .dir
        .clone()
        .unwrap_or_else(|| ConfigManager::cache_dir(&config));

    let ctx = Context {
        config,
        config_manager,
        cache_dir,
    };

    // Dispatch to command
    match cli.command {
        Commands::Serve => commands::serve(&ctx).await,
        Commands::Sweep(args) => commands::sweep(args, &ctx).await,
        Commands::List(args) => commands::list(args, &ctx).await,
        Commands::LogOut(args) => commands::log_out(args, &ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Config(args) => commands::config(args, &ctx).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `[general] log_format = "json"` for JSON lines
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("websessions=warn"),
        1 => EnvFilter::new("websessions=info"),
        _ => EnvFilter::new("websessions=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .without_time()
            .init();
    }
}
