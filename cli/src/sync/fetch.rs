//! Fetch coordination: prune unused clones and clone missing repositories.
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use rayon::prelude::*;

use super::{Labeled, SyncContext};
use crate::error::{GitError, SyncError};
use crate::git::{CloneOutcome, CloneRequest, Credential};

/// Counts from the fetch phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Distinct clone directories that were missing.
    pub missing: usize,
    /// Clones created by this run.
    pub cloned: usize,
    /// Missing clones whose destination turned out to be occupied.
    pub already_existed: usize,
    /// Selected repositories already in the cache.
    pub already_present: usize,
    /// Unused clones deleted.
    pub pruned: usize,
    /// Unused clones that could not be deleted.
    pub prune_failures: usize,
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cloned, {} already present",
            self.cloned,
            self.already_present + self.already_existed
        )?;
        if self.pruned > 0 || self.prune_failures > 0 {
            write!(f, ", {} pruned", self.pruned)?;
        }
        if self.prune_failures > 0 {
            write!(f, ", {} could not be deleted", self.prune_failures)?;
        }
        Ok(())
    }
}

/// Bring the cache up to date for `selected`.
///
/// When `clean` is set, clones in `inventory` whose name is not in `keep` are
/// offered for deletion with a single question; deletion is best-effort.
/// Missing repositories are then cloned in parallel, one worker each. A
/// repository is never cloned when its label is already in `inventory`.
///
/// # Errors
///
/// Returns [`SyncError::Credential`] if the SSH key cannot be read while
/// something needs cloning, [`SyncError::Prompt`] if the answer cannot be
/// read, and [`SyncError::CloneFailure`] for the first failed clone in
/// configuration order (after every clone has finished).
pub fn reconcile_fetch(
    ctx: &SyncContext,
    selected: &[Labeled<'_>],
    inventory: &BTreeSet<String>,
    keep: &BTreeSet<&str>,
    clean: bool,
) -> Result<FetchReport, SyncError> {
    let mut report = FetchReport::default();

    let mut seen = HashSet::new();
    let mut to_clone = Vec::new();
    for labeled in selected {
        if inventory.contains(labeled.label) {
            report.already_present += 1;
        } else if seen.insert(labeled.label) {
            // Entries sharing a label share one clone.
            to_clone.push(*labeled);
        }
    }
    report.missing = to_clone.len();

    if clean {
        prune(ctx, inventory, keep, &mut report)?;
    }

    let missing = report.missing;
    ctx.log.info(&format!("found {missing} missing repos"));
    if to_clone.is_empty() {
        return Ok(report);
    }

    let credential = Credential::from_key_file(&ctx.ssh_key).map_err(SyncError::Credential)?;
    let results = clone_all(ctx, &to_clone, &credential)?;

    // Results are in configuration order, so the first error wins.
    for (labeled, result) in to_clone.iter().zip(results) {
        let label = labeled.label;
        match result {
            Ok(CloneOutcome::Cloned) => {
                report.cloned += 1;
                ctx.log.info(&format!("cloned {label}"));
            }
            Ok(CloneOutcome::AlreadyExists) => {
                report.already_existed += 1;
                ctx.log.debug(&format!("{label} already exists, skipping"));
            }
            Err(source) => {
                return Err(SyncError::CloneFailure {
                    name: labeled.repo.name.clone(),
                    source,
                });
            }
        }
    }

    Ok(report)
}

fn clone_all(
    ctx: &SyncContext,
    to_clone: &[Labeled<'_>],
    credential: &Credential,
) -> Result<Vec<Result<CloneOutcome, GitError>>, SyncError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(to_clone.len())
        .thread_name(|i| format!("recon-clone-{i}"))
        .build()?;

    Ok(pool.install(|| {
        to_clone
            .par_iter()
            .map(|labeled| {
                ctx.log.debug(&format!("cloning {}", labeled.label));
                let request = CloneRequest {
                    remote: labeled.repo.remote.clone(),
                    destination: labeled.clone_dir(&ctx.cache_root),
                    branch: labeled.repo.branch.clone(),
                    version: labeled.repo.version.clone(),
                };
                ctx.vcs.clone_repo(&request, credential)
            })
            .collect()
    }))
}

fn prune(
    ctx: &SyncContext,
    inventory: &BTreeSet<String>,
    keep: &BTreeSet<&str>,
    report: &mut FetchReport,
) -> Result<(), SyncError> {
    let orphaned: Vec<&String> = inventory
        .iter()
        .filter(|name| !keep.contains(name.as_str()))
        .collect();

    let count = orphaned.len();
    ctx.log.info(&format!("found {count} unused repos"));
    if orphaned.is_empty() {
        return Ok(());
    }
    for name in &orphaned {
        ctx.log.debug(&format!("unused: {name}"));
    }

    let question = format!("delete {count} unused repos?");
    if !ctx.prompt.ask_yes_no(&question).map_err(SyncError::Prompt)? {
        ctx.log.info("keeping unused repos");
        return Ok(());
    }

    for name in orphaned {
        let path = ctx.cache_root.join(name);
        match ctx.fs.remove_dir_all(&path) {
            Ok(()) => {
                report.pruned += 1;
                ctx.log.info(&format!("deleted {}", path.display()));
            }
            Err(e) => {
                report.prune_failures += 1;
                ctx.log.warn(&format!("cannot delete {name}: {e}"));
            }
        }
    }
    Ok(())
}
