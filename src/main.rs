//! Bundlecache - offline cache manager for web app bundles
//!
//! CLI entry point that dispatches to subcommands.

use bundlecache::cli::{Cli, Commands};
use bundlecache::config::{Config, ConfigManager};
use bundlecache::error::BundleResult;
use clap::Parser;
use console::style;
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

async fn run() -> BundleResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    // Command-line overrides win over the file
    if let Some(ref origin) = cli.origin {
        config.app.origin = Some(origin.clone());
    }
    if let Some(ref bundle) = cli.bundle {
        config.app.bundle = Some(bundle.clone());
    }

    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Install => bundlecache::cli::commands::install(&config).await,
        Commands::Activate => bundlecache::cli::commands::activate(&config).await,
        Commands::Upgrade => bundlecache::cli::commands::upgrade(&config).await,
        Commands::Fetch(args) => bundlecache::cli::commands::fetch(args, &config).await,
        Commands::Message(args) => bundlecache::cli::commands::message(args, &config).await,
        Commands::Status(args) => bundlecache::cli::commands::status(args, &config).await,
        Commands::Purge(args) => bundlecache::cli::commands::purge(args, &config).await,
        Commands::Config(args) => {
            bundlecache::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 if config.general.verbose => "info",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::new(format!("bundlecache={}", level));

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
    }
}
