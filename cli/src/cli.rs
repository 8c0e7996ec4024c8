//! Command-line surface: global flags and subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for the recon config synchronizer.
#[derive(Parser, Debug)]
#[command(
    name = "recon",
    about = "Sync ~/.config entries with the git repositories they live in",
    version
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Flags accepted by every subcommand
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Config file to use instead of ~/.config/recon/recon.toml
    #[arg(short = 'f', long = "file", global = true, env = "RECON_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Override the home directory
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Answer yes to every question
    #[arg(short, long, global = true)]
    pub yes: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clone missing repositories and link them into ~/.config
    Sync(SyncOpts),
    /// Fast-forward one cached repository from its remote
    Pull(PullOpts),
    /// Register a new repository, clone it, and link it
    Add(AddOpts),
    /// Show each configured repository's clone and link state
    Status,
    /// Inspect the loaded configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information
    Version,
}

/// Options for the `sync` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct SyncOpts {
    /// Only sync the config with this name
    #[arg(long)]
    pub config: Option<String>,

    /// Offer to delete clones no configured repository uses
    #[arg(long)]
    pub clean: bool,
}

/// Options for the `pull` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PullOpts {
    /// Name of the config whose repository to update
    pub name: String,

    /// Branch to update (defaults to the configured or checked-out branch)
    #[arg(long)]
    pub branch: Option<String>,
}

/// Options for the `add` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct AddOpts {
    /// Name of the config directory under ~/.config
    pub name: String,

    /// Remote URL of the repository
    #[arg(long = "repo")]
    pub remote: String,

    /// Directory inside the repository holding the config
    #[arg(long)]
    pub path: Option<String>,

    /// Branch to track
    #[arg(long)]
    pub branch: Option<String>,

    /// Tag to pin
    #[arg(long)]
    pub version: Option<String>,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the parsed configuration
    Get {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    /// Name used for the log file of this invocation.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Sync(_) => "sync",
            Self::Pull(_) => "pull",
            Self::Add(_) => "add",
            Self::Status => "status",
            Self::Config(_) => "config",
            Self::Version => "version",
        }
    }
}
