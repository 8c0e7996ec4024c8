//! Command: fast-forward one cached repository.
use anyhow::{Context as _, Result};
use std::sync::Arc;

use super::{CommandSetup, ConfigRequirement};
use crate::cli::{GlobalOpts, PullOpts};
use crate::error::SyncError;
use crate::git::{Credential, PullOutcome, PullRequest};
use crate::logging::{Logger, PhaseStatus};
use crate::operations::EntryKind;

/// Run the pull command.
///
/// # Errors
///
/// Returns an error if the repository is unknown, not cloned yet, or the
/// pull fails.
pub fn run(global: &GlobalOpts, opts: &PullOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.clone(), ConfigRequirement::Required)?;
    let result = execute(&setup, opts);
    log.print_summary();
    result.map(|_| ())
}

/// Pull with an already prepared setup.
///
/// The branch is taken from `--branch`, then from the config entry, then
/// from whatever is checked out.
///
/// # Errors
///
/// Returns an error if the repository is unknown, not cloned yet, the SSH
/// key cannot be read, or the pull fails.
pub fn execute(setup: &CommandSetup, opts: &PullOpts) -> Result<PullOutcome> {
    let (repo, dir) = setup.locate(&opts.name)?;
    if setup.fs.entry_kind(&dir)? != EntryKind::Dir {
        anyhow::bail!(
            "{} is not cloned yet at {}; run `recon sync --config {}` first",
            repo.name,
            dir.display(),
            repo.name
        );
    }

    setup.log.stage(&format!("Pulling {}", repo.name));
    let credential = Credential::from_key_file(&setup.paths.ssh_key(&setup.config))
        .map_err(SyncError::Credential)?;
    let request = PullRequest {
        repo: dir,
        branch: opts.branch.clone().or_else(|| repo.branch.clone()),
    };

    let phase = format!("Pull {}", repo.name);
    let outcome = match setup.vcs.pull(&request, &credential) {
        Ok(outcome) => outcome,
        Err(e) => {
            setup
                .log
                .record_phase(&phase, PhaseStatus::Failed, Some(&e.to_string()));
            return Err(e).with_context(|| format!("pulling {}", repo.name));
        }
    };

    match &outcome {
        PullOutcome::UpToDate => {
            setup.log.info("already up to date");
            setup
                .log
                .record_phase(&phase, PhaseStatus::Skipped, Some("up to date"));
        }
        PullOutcome::FastForwarded { branch, commit } => {
            let message = format!("{branch} -> {commit}");
            setup.log.info(&format!("fast-forwarded {message}"));
            setup
                .log
                .record_phase(&phase, PhaseStatus::Ok, Some(&message));
        }
    }
    Ok(outcome)
}
