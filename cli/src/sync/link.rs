//! Symlink reconciliation between the config root and the cache.
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use super::{Labeled, SyncContext, io_error};
use crate::error::SyncError;
use crate::operations::{EntryKind, FileSystemOps};

/// The state of a config path relative to the link it should be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing exists at the path.
    Absent,
    /// A symlink to the expected source.
    Correct,
    /// A symlink to somewhere else.
    Stale {
        /// Where the link currently points.
        current: PathBuf,
    },
    /// A real file or directory the user owns.
    Conflict,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("not linked"),
            Self::Correct => f.write_str("linked"),
            Self::Stale { current } => write!(f, "stale link to {}", current.display()),
            Self::Conflict => f.write_str("blocked by existing config"),
        }
    }
}

/// Classify `link` against the expected `source` without following links.
///
/// # Errors
///
/// Returns an error if `link` cannot be inspected or its target read.
pub fn probe(fs: &dyn FileSystemOps, link: &Path, source: &Path) -> io::Result<LinkState> {
    Ok(match fs.entry_kind(link)? {
        EntryKind::Missing => LinkState::Absent,
        EntryKind::Symlink => {
            let current = fs.read_link(link)?;
            if current == source {
                LinkState::Correct
            } else {
                LinkState::Stale { current }
            }
        }
        EntryKind::Dir | EntryKind::File => LinkState::Conflict,
    })
}

/// Counts from the link phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Links created or repointed.
    pub linked: usize,
    /// Links that were already right.
    pub already_correct: usize,
    /// Conflicts the user chose to keep.
    pub skipped: usize,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} linked, {} already correct, {} skipped",
            self.linked, self.already_correct, self.skipped
        )
    }
}

/// Backup location for a config moved out of the way: `<config_root>/.<name>-old`.
#[must_use]
pub fn backup_path(config_root: &Path, name: &str) -> PathBuf {
    config_root.join(format!(".{name}-old"))
}

/// Link every selected repository into the config root, in order.
///
/// Existing real files or directories are only replaced after the user
/// agrees, and are moved to [`backup_path`] rather than deleted. Links made
/// before a failure are kept.
///
/// # Errors
///
/// Returns [`SyncError::Io`] if a path cannot be inspected,
/// [`SyncError::Prompt`] if an answer cannot be read, and
/// [`SyncError::LinkFailure`] if moving a conflict or creating a link fails.
pub fn reconcile(
    ctx: &SyncContext,
    selected: &[Labeled<'_>],
) -> Result<ReconcileReport, SyncError> {
    let fs = ctx.fs.as_ref();
    let mut report = ReconcileReport::default();

    if !selected.is_empty() {
        let root = &ctx.config_root;
        fs.create_dir_all(root).map_err(io_error(root))?;
    }

    for labeled in selected {
        let name = &labeled.repo.name;
        let source = labeled.link_source(&ctx.cache_root);
        let link = labeled.link_path(&ctx.config_root);
        let link_failure = |source: io::Error| SyncError::LinkFailure {
            name: name.clone(),
            source,
        };

        match probe(fs, &link, &source).map_err(io_error(&link))? {
            LinkState::Correct => {
                report.already_correct += 1;
                ctx.log.debug(&format!("ok: {name} (already linked)"));
                continue;
            }
            LinkState::Absent => {}
            LinkState::Stale { current } => {
                ctx.log.debug(&format!(
                    "removing stale link {} -> {}",
                    link.display(),
                    current.display()
                ));
                fs.remove(&link).map_err(link_failure)?;
            }
            LinkState::Conflict => {
                let backup = backup_path(&ctx.config_root, name);
                let question = format!(
                    "existing config found at {}. Replace it? (old config will be moved to {})",
                    link.display(),
                    backup.display()
                );
                if !ctx.prompt.ask_yes_no(&question).map_err(SyncError::Prompt)? {
                    report.skipped += 1;
                    ctx.log.info(&format!("skipping {name}"));
                    continue;
                }
                if fs.entry_kind(&backup).map_err(io_error(&backup))? != EntryKind::Missing {
                    return Err(link_failure(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("backup {} already exists", backup.display()),
                    )));
                }
                fs.rename(&link, &backup).map_err(link_failure)?;
                let moved = format!("moved {} to {}", link.display(), backup.display());
                ctx.log.info(&moved);
            }
        }

        if fs.entry_kind(&source).map_err(io_error(&source))? == EntryKind::Missing {
            let missing = format!("{name}: {} does not exist", source.display());
            ctx.log.warn(&missing);
        }
        fs.symlink(&source, &link).map_err(link_failure)?;
        report.linked += 1;
        let linked = format!("linked {} -> {}", link.display(), source.display());
        ctx.log.info(&linked);
    }

    Ok(report)
}
