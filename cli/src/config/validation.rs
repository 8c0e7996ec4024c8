//! Load-time validation of `recon.toml`.
//!
//! Hard problems (unusable names, malformed remotes, duplicates, label
//! collisions) abort loading with a [`ConfigError`]. Softer issues are
//! returned as [`ValidationWarning`]s for the caller to log.
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path};

use super::repo::RepoConfig;
use crate::error::ConfigError;
use crate::sync::label::label;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The repo entry that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning for `item`.
    #[must_use]
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.item, self.message)
    }
}

/// Validate every repo entry.
///
/// # Errors
///
/// Returns the first hard error in entry order.
pub fn validate_repos(repos: &[RepoConfig]) -> Result<Vec<ValidationWarning>, ConfigError> {
    let mut warnings = Vec::new();
    let mut names = HashSet::new();
    let mut labels: HashMap<String, &RepoConfig> = HashMap::new();

    for repo in repos {
        check_fields(repo)?;

        if !names.insert(repo.name.as_str()) {
            return Err(ConfigError::DuplicateName(repo.name.clone()));
        }

        let labeled = label(repo).map_err(|e| invalid(repo, e.to_string()))?;
        if let Some(first) = labels.get(&labeled) {
            // Same remote and ref share one clone; only distinct triples clash.
            if !same_source(first, repo) {
                return Err(ConfigError::LabelCollision {
                    label: labeled,
                    first: first.name.clone(),
                    second: repo.name.clone(),
                });
            }
        } else {
            labels.insert(labeled, repo);
        }

        warnings.extend(soft_checks(repo));
    }

    Ok(warnings)
}

fn check_fields(repo: &RepoConfig) -> Result<(), ConfigError> {
    let name = repo.name.trim();
    if name.is_empty() {
        return Err(invalid(repo, "name is empty"));
    }
    if name != repo.name {
        return Err(invalid(repo, "name has leading or trailing whitespace"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(invalid(repo, "name must be a single directory name"));
    }
    if repo.remote.trim().is_empty() {
        return Err(invalid(repo, "remote is empty"));
    }
    if repo.branch.as_deref().is_some_and(|b| b.trim().is_empty()) {
        return Err(invalid(repo, "branch is empty"));
    }
    if repo.version.as_deref().is_some_and(|v| v.trim().is_empty()) {
        return Err(invalid(repo, "version is empty"));
    }
    Ok(())
}

fn soft_checks(repo: &RepoConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let (Some(branch), Some(version)) = (&repo.branch, &repo.version) {
        warnings.push(ValidationWarning::new(
            &repo.name,
            format!(
                "branch '{branch}' is checked out, version '{version}' only names the clone"
            ),
        ));
    }

    let subpath = Path::new(repo.subpath());
    if subpath.is_absolute() {
        warnings.push(ValidationWarning::new(
            &repo.name,
            "path should be relative to the repository root",
        ));
    } else if subpath.components().any(|c| c == Component::ParentDir) {
        warnings.push(ValidationWarning::new(
            &repo.name,
            "path points outside the repository",
        ));
    }

    warnings
}

fn same_source(a: &RepoConfig, b: &RepoConfig) -> bool {
    a.remote == b.remote && a.version == b.version && a.branch == b.branch
}

fn invalid(repo: &RepoConfig, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidRepo {
        name: repo.name.clone(),
        reason: reason.into(),
    }
}
