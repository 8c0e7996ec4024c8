//! Repository descriptors: one `[[repos]]` entry in `recon.toml`.
use serde::{Deserialize, Serialize};

/// A configured mapping from a remote repository to a config directory name.
///
/// # Examples
///
/// ```
/// use recon_cli::config::repo::{CheckoutRef, RepoConfig};
///
/// let repo = RepoConfig::new("nvim", "git@github.com:me/dots.git")
///     .with_branch("main")
///     .with_subpath("nvim");
/// assert_eq!(repo.subpath(), "nvim");
/// assert_eq!(repo.checkout_ref(), Some(CheckoutRef::Branch("main")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Name of the config, e.g. `"tmux"`; the link is created at `~/.config/<name>`.
    pub name: String,

    /// Remote URL understood by git, e.g. `git@github.com:user/tmux-conf.git`.
    pub remote: String,

    /// Tag (or any revision) to check out when no branch is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Branch to clone; takes priority over `version` for checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Directory inside the repository holding the config; root when absent.
    #[serde(default, rename = "path", skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
}

/// Which ref a clone should end up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutRef<'a> {
    /// Clone only this branch and check it out.
    Branch(&'a str),
    /// Clone the default branch, then detach HEAD at this revision.
    Version(&'a str),
}

impl RepoConfig {
    /// Create a descriptor tracking the remote's default branch at its root.
    #[must_use]
    pub fn new(name: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: remote.into(),
            version: None,
            branch: None,
            subpath: None,
        }
    }

    /// Set the branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the path inside the repository.
    #[must_use]
    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = Some(subpath.into());
        self
    }

    /// Path inside the clone that the config link points at (`""` for the root).
    #[must_use]
    pub fn subpath(&self) -> &str {
        self.subpath.as_deref().unwrap_or("")
    }

    /// The ref to check out. A branch wins over a version.
    #[must_use]
    pub fn checkout_ref(&self) -> Option<CheckoutRef<'_>> {
        match (&self.branch, &self.version) {
            (Some(branch), _) => Some(CheckoutRef::Branch(branch)),
            (None, Some(version)) => Some(CheckoutRef::Version(version)),
            (None, None) => None,
        }
    }
}
