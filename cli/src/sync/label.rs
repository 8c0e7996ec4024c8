//! Directory labeling: map a repository descriptor to the name of its clone
//! directory under the cache root.
//!
//! The label is derived from the remote alone when neither a version nor a
//! branch is pinned, so every descriptor tracking the same remote's default
//! branch shares one clone. Pinned descriptors get a `-version:<v>` or
//! `-branch:<b>` suffix. Version wins over branch here, while branch wins for
//! checkout; existing caches depend on that asymmetry. The `:` in pinned
//! labels is not a valid file name character on Windows.
use crate::config::repo::RepoConfig;
use crate::error::SyncError;

/// Compute the labeled directory name for `repo`.
///
/// # Errors
///
/// Returns [`SyncError::MalformedRemote`] when the remote has no
/// `<host>:<path>` or `<scheme>://<host>/<path>` shape.
///
/// # Examples
///
/// ```
/// use recon_cli::config::repo::RepoConfig;
/// use recon_cli::sync::label::label;
///
/// let repo = RepoConfig::new("tmux", "git@github.com:user/tmux-conf.git");
/// assert_eq!(label(&repo).unwrap(), "user_tmux_conf");
///
/// let pinned = repo.with_version("v1.2-rc");
/// assert_eq!(label(&pinned).unwrap(), "user_tmux_conf-version:v1.2_rc");
/// ```
pub fn label(repo: &RepoConfig) -> Result<String, SyncError> {
    let name = normalize(repository_path(&repo.remote)?);

    let pinned = match (&repo.version, &repo.branch) {
        (Some(version), _) => Some(("version", version)),
        (None, Some(branch)) => Some(("branch", branch)),
        (None, None) => None,
    };

    Ok(match pinned {
        Some((mode, reference)) => format!("{name}-{mode}:{}", normalize(reference)),
        None => name,
    })
}

/// Split off the transport and host, returning the repository path segment.
fn repository_path(remote: &str) -> Result<&str, SyncError> {
    let malformed = || SyncError::MalformedRemote(remote.to_string());
    let remote = remote.trim();

    let path = if let Some((_scheme, rest)) = remote.split_once("://") {
        // `file:///srv/dots.git` has an empty host, which is fine.
        rest.split_once('/').map(|(_host, path)| path)
    } else {
        remote
            .split_once(':')
            .filter(|(host, _)| !host.is_empty() && !host.contains('/'))
            .map(|(_host, path)| path)
    }
    .ok_or_else(malformed)?;

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path).trim_end_matches('/');
    if path.is_empty() {
        return Err(malformed());
    }
    Ok(path)
}

fn normalize(segment: &str) -> String {
    segment.replace(['/', '\\', '-'], "_")
}
