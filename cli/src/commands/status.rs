//! Command: report clone and link state for every configured repository.
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use super::{CommandSetup, ConfigRequirement};
use crate::cli::GlobalOpts;
use crate::git::HeadState;
use crate::logging::Logger;
use crate::operations::EntryKind;
use crate::sync::label::label;
use crate::sync::link::{LinkState, probe};
use crate::sync::Labeled;

/// State of one configured repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    /// Config name.
    pub name: String,
    /// Clone directory name.
    pub label: String,
    /// HEAD of the clone, `None` when it is not cloned.
    pub head: Option<HeadState>,
    /// The config link's state.
    pub link: LinkState,
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: ", self.name, self.label)?;
        match &self.head {
            None => f.write_str("not cloned")?,
            Some(head) => {
                write!(f, "{} (", head.commit)?;
                match (&head.branch, &head.tag) {
                    (Some(branch), _) => f.write_str(branch)?,
                    (None, Some(tag)) => write!(f, "tag {tag}")?,
                    (None, None) => f.write_str("detached")?,
                }
                f.write_str(")")?;
            }
        }
        write!(f, ", {}", self.link)
    }
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or a clone cannot be
/// inspected.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.clone(), ConfigRequirement::Required)?;
    execute(&setup).map(|_| ())
}

/// Collect and log the status of every repository. Read-only.
///
/// # Errors
///
/// Returns an error if a remote is malformed or a path cannot be inspected.
pub fn execute(setup: &CommandSetup) -> Result<Vec<RepoStatus>> {
    let cache_root = setup.paths.cache_root(&setup.config);
    let config_root = setup.paths.config_root();
    setup.log.stage("Status");

    let mut statuses = Vec::with_capacity(setup.config.repos.len());
    for repo in &setup.config.repos {
        let label = label(repo)?;
        let labeled = Labeled {
            repo,
            label: &label,
        };
        let dir = labeled.clone_dir(&cache_root);
        let head = if setup.fs.entry_kind(&dir)? == EntryKind::Dir {
            match setup.vcs.head_state(&dir) {
                Ok(head) => Some(head),
                Err(e) => {
                    setup
                        .log
                        .warn(&format!("cannot read {}: {e}", dir.display()));
                    None
                }
            }
        } else {
            None
        };
        let link = probe(
            setup.fs.as_ref(),
            &labeled.link_path(&config_root),
            &labeled.link_source(&cache_root),
        )?;

        let status = RepoStatus {
            name: repo.name.clone(),
            label: label.clone(),
            head,
            link,
        };
        setup.log.info(&status.to_string());
        statuses.push(status);
    }

    if statuses.is_empty() {
        setup.log.info("no repos configured");
    }
    Ok(statuses)
}
