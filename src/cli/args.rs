//! CLI argument definitions using clap derive

use crate::worker::ControlMessage;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bundlecache - offline cache manager for web app bundles
///
/// Installs, activates and serves a deployed application bundle from
/// persistent cache stores.
#[derive(Parser, Debug)]
#[command(name = "bundlecache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BUNDLECACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Application origin (overrides app.origin)
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Bundle descriptor path (overrides app.bundle)
    #[arg(long, global = true)]
    pub bundle: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the shell files into the staging store
    Install,

    /// Reconcile the stores for the configured bundle
    Activate,

    /// Install and activate in one step
    Upgrade,

    /// Resolve a request through the worker
    Fetch(FetchArgs),

    /// Send a control message to the worker
    Message(MessageArgs),

    /// Show store contents and manifest state
    Status(StatusArgs),

    /// Delete every store
    Purge(PurgeArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL, or a path relative to the origin
    pub url: String,

    /// Write the body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message to deliver
    pub message: MessageKind,
}

/// Control messages accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageKind {
    /// Activate without waiting for older workers
    SkipWaiting,
    /// Cache every resource not cached yet
    DownloadOffline,
}

impl From<MessageKind> for ControlMessage {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::SkipWaiting => ControlMessage::SkipWaiting,
            MessageKind::DownloadOffline => ControlMessage::DownloadOffline,
        }
    }
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the purge command
#[derive(Parser, Debug)]
pub struct PurgeArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple key=value lines
    Plain,
}
