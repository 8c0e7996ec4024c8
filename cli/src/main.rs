//! `recon` binary: parse arguments, set up logging, run one subcommand.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use recon_cli::cli::{Cli, Command};
use recon_cli::commands;
use recon_cli::logging::{self, Logger};

fn main() -> Result<()> {
    let args = Cli::parse();
    let name = args.command.log_name();
    let log_file = logging::log_file_for(args.global.home.as_deref(), name);
    let log_file = logging::init_subscriber(args.verbose, name, log_file);
    let log = Arc::new(Logger::new(log_file));

    match &args.command {
        Command::Sync(opts) => commands::sync::run(&args.global, opts, &log),
        Command::Pull(opts) => commands::pull::run(&args.global, opts, &log),
        Command::Add(opts) => commands::add::run(&args.global, opts, &log),
        Command::Status => commands::status::run(&args.global, &log),
        Command::Config(command) => commands::config::run(&args.global, command, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
