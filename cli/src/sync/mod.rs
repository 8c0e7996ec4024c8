//! The reconciliation engine.
//!
//! A sync run labels every selected repository, scans the cache root once,
//! clones what is missing in parallel, then links each config into the
//! config root one at a time. The first failing phase aborts the run and its
//! error is returned unchanged.
pub mod fetch;
pub mod inventory;
pub mod label;
pub mod link;

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::repo::RepoConfig;
use crate::error::SyncError;
use crate::git::Vcs;
use crate::logging::{Log, PhaseStatus};
use crate::operations::FileSystemOps;
use crate::prompt::Prompt;

pub use fetch::FetchReport;
pub use link::{LinkState, ReconcileReport};

/// Collaborators and roots for one sync run.
pub struct SyncContext {
    /// Logger for output and phase recording.
    pub log: Arc<dyn Log>,
    /// Filesystem access (injectable for testing).
    pub fs: Arc<dyn FileSystemOps>,
    /// Version control (injectable for testing).
    pub vcs: Arc<dyn Vcs>,
    /// Source of yes/no answers.
    pub prompt: Arc<dyn Prompt>,
    /// Directory holding one clone per labeled repository.
    pub cache_root: PathBuf,
    /// Directory where config links are created (`~/.config`).
    pub config_root: PathBuf,
    /// Private key read when something needs cloning.
    pub ssh_key: PathBuf,
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("log", &"<dyn Log>")
            .field("fs", &self.fs)
            .field("vcs", &"<dyn Vcs>")
            .field("prompt", &"<dyn Prompt>")
            .field("cache_root", &self.cache_root)
            .field("config_root", &self.config_root)
            .field("ssh_key", &self.ssh_key)
            .finish()
    }
}

/// A repository paired with its cache directory name.
#[derive(Debug, Clone, Copy)]
pub struct Labeled<'a> {
    /// The configured repository.
    pub repo: &'a RepoConfig,
    /// Its directory name under the cache root.
    pub label: &'a str,
}

impl Labeled<'_> {
    /// Where the clone lives.
    #[must_use]
    pub fn clone_dir(&self, cache_root: &Path) -> PathBuf {
        cache_root.join(self.label)
    }

    /// What the config link should point at.
    #[must_use]
    pub fn link_source(&self, cache_root: &Path) -> PathBuf {
        let dir = self.clone_dir(cache_root);
        match self.repo.subpath().trim_matches('/') {
            "" => dir,
            sub => dir.join(sub),
        }
    }

    /// Where the config link goes.
    #[must_use]
    pub fn link_path(&self, config_root: &Path) -> PathBuf {
        config_root.join(&self.repo.name)
    }
}

/// Options for [`sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Only sync the repository with this name.
    pub config_filter: Option<String>,
    /// Offer to delete clones no configured repository uses.
    pub clean: bool,
}

/// Counts from a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Number of configured repositories in the cache before fetching.
    pub cached: usize,
    /// Fetch phase counts.
    pub fetch: FetchReport,
    /// Link phase counts.
    pub reconcile: ReconcileReport,
}

/// Run a full sync of `repos` (the whole configured list).
///
/// `--config` narrows fetching and linking to one entry, but orphan detection
/// always considers every configured repository so that filtering never marks
/// another entry's clone as unused.
///
/// # Errors
///
/// Returns [`SyncError::ConfigNotFound`] if the filter matches nothing, and
/// otherwise the first error raised by a phase.
pub fn sync(
    ctx: &SyncContext,
    repos: &[RepoConfig],
    options: &SyncOptions,
) -> Result<SyncSummary, SyncError> {
    let labels = repos
        .iter()
        .map(label::label)
        .collect::<Result<Vec<_>, _>>()?;
    let all: Vec<Labeled<'_>> = repos
        .iter()
        .zip(&labels)
        .map(|(repo, label)| Labeled { repo, label })
        .collect();

    let selected: Vec<Labeled<'_>> = match &options.config_filter {
        Some(name) => {
            let found = all.iter().find(|l| &l.repo.name == name).copied();
            vec![found.ok_or_else(|| SyncError::ConfigNotFound(name.clone()))?]
        }
        None => all.clone(),
    };
    let keep: BTreeSet<&str> = all.iter().map(|l| l.label).collect();

    ctx.log.stage("Scan cache");
    let inventory = run_phase(
        ctx.log.as_ref(),
        "Scan cache",
        inventory::scan(ctx.fs.as_ref(), &ctx.cache_root),
        |inv| (PhaseStatus::Ok, format!("{} cached", inv.len())),
    )?;
    let cached = selected
        .iter()
        .filter(|l| inventory.contains(l.label))
        .count();

    ctx.log.stage("Fetch repositories");
    let fetch = run_phase(
        ctx.log.as_ref(),
        "Fetch repositories",
        fetch::reconcile_fetch(ctx, &selected, &inventory, &keep, options.clean),
        |r| {
            let status = if r.missing == 0 && r.pruned == 0 {
                PhaseStatus::Skipped
            } else {
                PhaseStatus::Ok
            };
            (status, r.to_string())
        },
    )?;

    ctx.log.stage("Link configs");
    let reconcile = run_phase(
        ctx.log.as_ref(),
        "Link configs",
        link::reconcile(ctx, &selected),
        |r| (PhaseStatus::Ok, r.to_string()),
    )?;

    Ok(SyncSummary {
        cached,
        fetch,
        reconcile,
    })
}

/// Record the outcome of a phase and pass its result through.
fn run_phase<T>(
    log: &dyn Log,
    name: &str,
    result: Result<T, SyncError>,
    describe: impl FnOnce(&T) -> (PhaseStatus, String),
) -> Result<T, SyncError> {
    match &result {
        Ok(value) => {
            let (status, message) = describe(value);
            log.record_phase(name, status, Some(&message));
        }
        Err(e) => {
            log.error(&format!("{name} failed: {e}"));
            log.record_phase(name, PhaseStatus::Failed, Some(&e.to_string()));
        }
    }
    result
}

/// Build a `map_err` adapter that wraps an I/O error with `path`.
pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SyncError + use<> {
    let path = path.display().to_string();
    move |source| SyncError::Io { path, source }
}
