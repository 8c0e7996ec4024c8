//! Command: register a repository, clone and link it, then save the config.
use anyhow::{Context as _, Result};
use std::sync::Arc;

use super::{CommandSetup, ConfigRequirement};
use crate::cli::{AddOpts, GlobalOpts, SyncOpts};
use crate::config::repo::RepoConfig;
use crate::logging::Logger;
use crate::sync::SyncSummary;

/// Run the add command.
///
/// # Errors
///
/// Returns an error if the entry is invalid, cloning or linking fails, or
/// the config cannot be written.
pub fn run(global: &GlobalOpts, opts: &AddOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.clone(), ConfigRequirement::Optional)?;
    let result = execute(setup, opts);
    log.print_summary();
    result.map(|_| ())
}

/// Add with an already prepared setup.
///
/// The config file is only written once the new repository is in place, so a
/// failed clone leaves it untouched.
///
/// # Errors
///
/// Returns an error if the entry is invalid or clashes with an existing one,
/// cloning or linking fails, or the config cannot be written.
pub fn execute(mut setup: CommandSetup, opts: &AddOpts) -> Result<SyncSummary> {
    let repo = RepoConfig {
        name: opts.name.clone(),
        remote: opts.remote.clone(),
        version: opts.version.clone(),
        branch: opts.branch.clone(),
        subpath: opts.path.clone(),
    };

    for warning in setup
        .config
        .add_repo(repo)
        .with_context(|| format!("adding {}", opts.name))?
    {
        setup.log.warn(&format!("  {warning}"));
    }
    setup
        .paths
        .check_link_targets(&setup.config)
        .with_context(|| format!("adding {}", opts.name))?;

    let summary = super::sync::execute(
        &setup,
        &SyncOpts {
            config: Some(opts.name.clone()),
            clean: false,
        },
    )?;

    setup.config.save(&setup.paths.config_file)?;
    setup.log.info(&format!(
        "added {} to {}",
        opts.name,
        setup.paths.config_file.display()
    ));
    Ok(summary)
}
