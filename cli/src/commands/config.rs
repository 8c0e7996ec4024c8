//! Command: inspect the loaded configuration.
use anyhow::Result;
use std::sync::Arc;

use super::{CommandSetup, ConfigRequirement};
use crate::cli::{ConfigCommand, GlobalOpts};
use crate::logging::Logger;

/// Run a `config` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or serialized.
pub fn run(global: &GlobalOpts, command: &ConfigCommand, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.clone(), ConfigRequirement::Required)?;
    match command {
        ConfigCommand::Get { json } => {
            let rendered = render(&setup, *json)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{rendered}");
            }
        }
    }
    Ok(())
}

/// Render the effective configuration as TOML or JSON.
///
/// Defaults are filled in so the output shows what a sync would use.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(setup: &CommandSetup, json: bool) -> Result<String> {
    let mut effective = setup.config.clone();
    effective.clone_dir = Some(setup.paths.cache_root(&setup.config).display().to_string());
    effective.ssh_key = Some(setup.paths.ssh_key(&setup.config).display().to_string());

    Ok(if json {
        serde_json::to_string_pretty(&effective)?
    } else {
        toml::to_string_pretty(&effective)?
    })
}
