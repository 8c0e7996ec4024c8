//! Command: sync configured repositories into `~/.config`.
use anyhow::{Context as _, Result};
use std::sync::Arc;

use super::{CommandSetup, ConfigRequirement};
use crate::cli::{GlobalOpts, SyncOpts};
use crate::logging::Logger;
use crate::sync::{self, SyncOptions, SyncSummary};

/// Run the sync command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or any sync phase fails.
pub fn run(global: &GlobalOpts, opts: &SyncOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.clone(), ConfigRequirement::Required)?;
    let result = execute(&setup, opts);
    log.print_summary();
    result.map(|_| ())
}

/// Sync with an already prepared setup.
///
/// # Errors
///
/// Returns an error if the cache root cannot be created or any sync phase
/// fails.
pub fn execute(setup: &CommandSetup, opts: &SyncOpts) -> Result<SyncSummary> {
    setup.ensure_cache_root()?;

    let options = SyncOptions {
        config_filter: opts.config.clone(),
        clean: opts.clean,
    };
    let summary = sync::sync(&setup.sync_context(), &setup.config.repos, &options)
        .context("sync failed")?;

    let linked = summary.reconcile.linked;
    setup.log.info(&format!("resolved {linked} symlink(s)"));
    Ok(summary)
}
