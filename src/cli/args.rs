//! CLI argument definitions using clap derive

use clap::{ArgAction, ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// websessions - Flat-file web session cache
///
/// Inspects and maintains a directory of web sessions shared by one or
/// more server instances.
#[derive(Parser, Debug)]
#[command(name = "websessions")]
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
    #[arg(short, long, global = true, env = "WEBSESSIONS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session directory (overrides [cache] directory)
    #[arg(long, global = true, env = "WEBSESSIONS_DIR")]
    pub dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the periodic cleanup until interrupted
    Serve,

    /// Remove expired sessions once
    Sweep(SweepArgs),

    /// List stored sessions
    List(ListArgs),

    /// Log users out by invalidating their sessions
    LogOut(LogOutArgs),

    /// Show cache directory, policy and entry count
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the sweep command
#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the log-out command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["all", "account", "key"])))]
pub struct LogOutArgs {
    /// Clear web sessions for all users
    #[arg(long)]
    pub all: bool,

    /// Account id whose sessions are cleared (repeatable)
    #[arg(short, long)]
    pub account: Vec<i32>,

    /// Individual session key to clear (repeatable)
    #[arg(short, long)]
    pub key: Vec<String>,
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

/// Output format for list-style commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
