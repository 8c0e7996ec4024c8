//! Version-control collaborator backed by libgit2.
//!
//! The sync engine only talks to the [`Vcs`] trait so tests can substitute a
//! mock; [`Git2Client`] is the production implementation.
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    AnnotatedCommit, Cred, CredentialType, ErrorCode, FetchOptions, Oid, RemoteCallbacks,
    Repository,
};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::GitError;

/// Username offered to SSH servers when the remote URL does not name one.
const DEFAULT_SSH_USER: &str = "git";

/// libgit2 keeps invoking the credential callback while the server rejects
/// what it is given; stop after this many tries.
const MAX_CREDENTIAL_ATTEMPTS: u8 = 3;

/// Name of the remote created by clone.
const ORIGIN: &str = "origin";

/// SSH credential shared read-only by every clone in a run.
#[derive(Clone)]
pub struct Credential {
    username: String,
    private_key: Option<String>,
}

impl Credential {
    /// Read the private key at `path` once, up front.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::KeyFile`] if the key cannot be read.
    pub fn from_key_file(path: &Path) -> Result<Self, GitError> {
        let private_key = std::fs::read_to_string(path).map_err(|source| GitError::KeyFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            username: DEFAULT_SSH_USER.to_string(),
            private_key: Some(private_key),
        })
    }

    /// A credential without a key; SSH authentication falls back to the agent.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            username: DEFAULT_SSH_USER.to_string(),
            private_key: None,
        }
    }

    fn callbacks(&self) -> RemoteCallbacks<'_> {
        let mut attempts = 0u8;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            let user = username_from_url.unwrap_or(&self.username);
            if allowed.contains(CredentialType::USERNAME) {
                return Cred::username(user);
            }
            if allowed.contains(CredentialType::SSH_KEY) {
                return match &self.private_key {
                    Some(key) => Cred::ssh_key_from_memory(user, None, key, None),
                    None => Cred::ssh_key_from_agent(user),
                };
            }
            Cred::default()
        });
        callbacks
    }

    fn fetch_options(&self) -> FetchOptions<'_> {
        let mut options = FetchOptions::new();
        options.remote_callbacks(self.callbacks());
        options
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// What to clone and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Remote URL.
    pub remote: String,
    /// Directory to clone into; must not exist or be empty.
    pub destination: PathBuf,
    /// Fetch only this branch and check it out.
    pub branch: Option<String>,
    /// Detach HEAD at this revision after cloning (ignored when `branch` is set).
    pub version: Option<String>,
}

/// Successful clone results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    /// A fresh clone was created.
    Cloned,
    /// Something already occupies the destination; nothing was done.
    AlreadyExists,
}

/// What to update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Path of the local clone.
    pub repo: PathBuf,
    /// Branch to update; the checked-out branch when `None`.
    pub branch: Option<String>,
}

/// Successful pull results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The local branch already matches the remote.
    UpToDate,
    /// The local branch moved forward.
    FastForwarded {
        /// Branch that was updated.
        branch: String,
        /// Short id of the new tip.
        commit: String,
    },
}

/// Where a clone's HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadState {
    /// Short commit id.
    pub commit: String,
    /// Checked-out branch, `None` when detached.
    pub branch: Option<String>,
    /// A tag pointing at the commit, if any.
    pub tag: Option<String>,
}

/// Operations the sync engine needs from version control.
#[cfg_attr(test, mockall::automock)]
pub trait Vcs: Send + Sync {
    /// Clone `request.remote` into `request.destination`.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than an occupied destination.
    fn clone_repo(
        &self,
        request: &CloneRequest,
        credential: &Credential,
    ) -> Result<CloneOutcome, GitError>;

    /// Fetch from origin and fast-forward a local branch.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching fails, HEAD is detached and no branch was
    /// given, or the branches have diverged.
    fn pull(&self, request: &PullRequest, credential: &Credential) -> Result<PullOutcome, GitError>;

    /// Inspect the HEAD of the clone at `repo`.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo` is not a readable repository.
    fn head_state(&self, repo: &Path) -> Result<HeadState, GitError>;
}

/// [`Vcs`] implementation using `git2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Client;

impl Vcs for Git2Client {
    fn clone_repo(
        &self,
        request: &CloneRequest,
        credential: &Credential,
    ) -> Result<CloneOutcome, GitError> {
        let mut builder = RepoBuilder::new();
        builder.fetch_options(credential.fetch_options());

        if let Some(branch) = &request.branch {
            builder.branch(branch);
            let branch = branch.clone();
            builder.remote_create(move |repo, name, url| {
                let refspec = format!("+refs/heads/{branch}:refs/remotes/{name}/{branch}");
                repo.remote_with_fetch(name, url, &refspec)
            });
        }

        let repo = match builder.clone(&request.remote, &request.destination) {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::Exists => return Ok(CloneOutcome::AlreadyExists),
            Err(e) => return Err(e.into()),
        };

        if request.branch.is_none()
            && let Some(version) = &request.version
            && let Err(e) = detach_at(&repo, version)
        {
            // A leftover clone would be taken as fetched by the next scan.
            drop(repo);
            if let Err(cleanup) = std::fs::remove_dir_all(&request.destination) {
                let path = request.destination.display();
                tracing::warn!(%path, "cannot remove partial clone: {cleanup}");
            }
            return Err(e);
        }

        Ok(CloneOutcome::Cloned)
    }

    fn pull(
        &self,
        request: &PullRequest,
        credential: &Credential,
    ) -> Result<PullOutcome, GitError> {
        let repo = Repository::open(&request.repo)?;
        let branch = match &request.branch {
            Some(branch) => branch.clone(),
            None => match checked_out_branch(&repo)? {
                Some(branch) => branch,
                None => return Err(GitError::DetachedHead(request.repo.display().to_string())),
            },
        };

        let mut remote = repo.find_remote(ORIGIN)?;
        remote.fetch(
            &[branch.as_str()],
            Some(&mut credential.fetch_options()),
            None,
        )?;
        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let incoming = repo.reference_to_annotated_commit(&fetch_head)?;

        fast_forward(&repo, &branch, &incoming)
    }

    fn head_state(&self, repo: &Path) -> Result<HeadState, GitError> {
        let repo = Repository::open(repo)?;
        let head = repo.head()?;
        let commit = head.peel_to_commit()?;
        let branch = if head.is_branch() {
            head.shorthand().map(String::from)
        } else {
            None
        };
        Ok(HeadState {
            commit: short_id(&repo, commit.id())?,
            branch,
            tag: tag_at(&repo, commit.id())?,
        })
    }
}

fn detach_at(repo: &Repository, version: &str) -> Result<(), GitError> {
    let commit = repo.revparse_single(version)?.peel_to_commit()?;
    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
    repo.set_head_detached(commit.id())?;
    Ok(())
}

fn checked_out_branch(repo: &Repository) -> Result<Option<String>, GitError> {
    let head = repo.head()?;
    Ok(if head.is_branch() {
        head.shorthand().map(String::from)
    } else {
        None
    })
}

fn fast_forward(
    repo: &Repository,
    branch: &str,
    incoming: &AnnotatedCommit<'_>,
) -> Result<PullOutcome, GitError> {
    let refname = format!("refs/heads/{branch}");
    let message = format!("recon pull: fast-forward {branch} to {}", incoming.id());
    let target = repo.find_object(incoming.id(), None)?;
    let is_head = checked_out_branch(repo)?.as_deref() == Some(branch);

    match repo.find_reference(&refname) {
        Ok(mut reference) => {
            let (analysis, _) = repo.merge_analysis_for_ref(&reference, &[incoming])?;
            if analysis.is_up_to_date() {
                return Ok(PullOutcome::UpToDate);
            }
            if !analysis.is_fast_forward() {
                return Err(GitError::NotFastForward(branch.to_string()));
            }
            if is_head {
                repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
            }
            reference.set_target(incoming.id(), &message)?;
        }
        Err(e) if e.code() == ErrorCode::NotFound => {
            // Branch not present locally yet, e.g. a version-pinned clone.
            repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
            repo.reference(&refname, incoming.id(), false, &message)?;
            repo.set_head(&refname)?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(PullOutcome::FastForwarded {
        branch: branch.to_string(),
        commit: short_id(repo, incoming.id())?,
    })
}

fn short_id(repo: &Repository, id: Oid) -> Result<String, GitError> {
    let object = repo.find_object(id, None)?;
    let buf = object.short_id()?;
    Ok(buf.as_str().unwrap_or_default().to_string())
}

/// First tag (in ref order) whose target peels to `id`.
fn tag_at(repo: &Repository, id: Oid) -> Result<Option<String>, GitError> {
    let mut found = None;
    repo.tag_foreach(|tag_id, name| {
        if found.is_none()
            && repo
                .find_object(tag_id, None)
                .and_then(|o| o.peel_to_commit())
                .is_ok_and(|c| c.id() == id)
        {
            let name = String::from_utf8_lossy(name);
            found = Some(name.trim_start_matches("refs/tags/").to_string());
        }
        true
    })?;
    Ok(found)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use git2::{Commit, RepositoryInitOptions, Signature};
    use std::fs;

    /// A non-bare upstream repository on `main` with one commit.
    fn upstream(dir: &Path) -> Repository {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir, &opts).unwrap();
        commit_file(&repo, "config", "first", "initial");
        repo
    }

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        fs::write(workdir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("recon", "recon@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn clone(request: &CloneRequest) -> Result<CloneOutcome, GitError> {
        Git2Client.clone_repo(request, &Credential::anonymous())
    }

    fn request(remote: &Path, destination: PathBuf) -> CloneRequest {
        CloneRequest {
            remote: remote.display().to_string(),
            destination,
            branch: None,
            version: None,
        }
    }

    #[test]
    fn credential_debug_redacts_key() {
        let tmp = tempfile::tempdir().unwrap();
        let key = tmp.path().join("id_rsa");
        fs::write(&key, "-----BEGIN SECRET-----").unwrap();
        let cred = Credential::from_key_file(&key).unwrap();
        let debug = format!("{cred:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("SECRET"));
    }

    #[test]
    fn missing_key_file_is_key_file_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Credential::from_key_file(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, GitError::KeyFile { .. }));
    }

    #[test]
    fn clone_checks_out_default_branch() {
        let tmp = tempfile::tempdir().unwrap();
        upstream(&tmp.path().join("up"));
        let dest = tmp.path().join("clone");

        let outcome = clone(&request(&tmp.path().join("up"), dest.clone())).unwrap();

        assert_eq!(outcome, CloneOutcome::Cloned);
        assert_eq!(fs::read_to_string(dest.join("config")).unwrap(), "first");
        let head = Git2Client.head_state(&dest).unwrap();
        assert_eq!(head.branch.as_deref(), Some("main"));
        assert!(head.tag.is_none());
    }

    #[test]
    fn clone_into_occupied_directory_reports_already_exists() {
        let tmp = tempfile::tempdir().unwrap();
        upstream(&tmp.path().join("up"));
        let dest = tmp.path().join("clone");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("stray"), "x").unwrap();

        let outcome = clone(&request(&tmp.path().join("up"), dest)).unwrap();

        assert_eq!(outcome, CloneOutcome::AlreadyExists);
    }

    #[test]
    fn clone_of_missing_remote_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let nowhere = tmp.path().join("nowhere");
        let result = clone(&request(&nowhere, tmp.path().join("clone")));
        assert!(matches!(result, Err(GitError::Libgit(_))));
    }

    #[test]
    fn clone_with_branch_fetches_only_that_branch() {
        let tmp = tempfile::tempdir().unwrap();
        let up = upstream(&tmp.path().join("up"));
        let head = up.head().unwrap().peel_to_commit().unwrap();
        up.branch("dev", &head, false).unwrap();
        let dest = tmp.path().join("clone");

        let mut req = request(&tmp.path().join("up"), dest.clone());
        req.branch = Some("dev".to_string());
        clone(&req).unwrap();

        let cloned = Repository::open(&dest).unwrap();
        assert_eq!(cloned.head().unwrap().shorthand(), Some("dev"));
        assert!(cloned.find_reference("refs/remotes/origin/dev").is_ok());
        assert!(cloned.find_reference("refs/remotes/origin/main").is_err());
    }

    #[test]
    fn clone_with_version_detaches_at_tag() {
        let tmp = tempfile::tempdir().unwrap();
        let up = upstream(&tmp.path().join("up"));
        let tagged = up.head().unwrap().peel_to_commit().unwrap();
        up.tag_lightweight("v1", tagged.as_object(), false).unwrap();
        commit_file(&up, "config", "second", "after tag");
        let dest = tmp.path().join("clone");

        let mut req = request(&tmp.path().join("up"), dest.clone());
        req.version = Some("v1".to_string());
        clone(&req).unwrap();

        assert_eq!(fs::read_to_string(dest.join("config")).unwrap(), "first");
        let head = Git2Client.head_state(&dest).unwrap();
        assert!(head.branch.is_none());
        assert_eq!(head.tag.as_deref(), Some("v1"));
    }

    #[test]
    fn unknown_version_leaves_no_clone_behind() {
        let tmp = tempfile::tempdir().unwrap();
        upstream(&tmp.path().join("up"));
        let dest = tmp.path().join("u_r-version:v9");

        let mut req = request(&tmp.path().join("up"), dest.clone());
        req.version = Some("v9".to_string());
        let err = clone(&req).unwrap_err();

        assert!(matches!(err, GitError::Libgit(_)));
        assert!(!dest.exists(), "partial clone must be removed");

        // A retry starts from scratch instead of reporting AlreadyExists.
        let retry = clone(&req).unwrap_err();
        assert!(matches!(retry, GitError::Libgit(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn pull_fast_forwards_then_reports_up_to_date() {
        let tmp = tempfile::tempdir().unwrap();
        let up = upstream(&tmp.path().join("up"));
        let dest = tmp.path().join("clone");
        clone(&request(&tmp.path().join("up"), dest.clone())).unwrap();
        commit_file(&up, "config", "second", "update");

        let pull = PullRequest {
            repo: dest.clone(),
            branch: None,
        };
        let outcome = Git2Client.pull(&pull, &Credential::anonymous()).unwrap();
        assert!(matches!(
            outcome,
            PullOutcome::FastForwarded { ref branch, .. } if branch == "main"
        ));
        assert_eq!(fs::read_to_string(dest.join("config")).unwrap(), "second");

        let again = Git2Client.pull(&pull, &Credential::anonymous()).unwrap();
        assert_eq!(again, PullOutcome::UpToDate);
    }

    #[test]
    fn pull_refuses_diverged_branch() {
        let tmp = tempfile::tempdir().unwrap();
        let up = upstream(&tmp.path().join("up"));
        let dest = tmp.path().join("clone");
        clone(&request(&tmp.path().join("up"), dest.clone())).unwrap();
        commit_file(&up, "config", "upstream", "upstream change");
        let local = Repository::open(&dest).unwrap();
        commit_file(&local, "other", "local", "local change");

        let err = Git2Client
            .pull(
                &PullRequest {
                    repo: dest,
                    branch: None,
                },
                &Credential::anonymous(),
            )
            .unwrap_err();
        assert!(matches!(err, GitError::NotFastForward(ref b) if b == "main"));
    }

    #[test]
    fn pull_on_detached_head_needs_a_branch() {
        let tmp = tempfile::tempdir().unwrap();
        let up = upstream(&tmp.path().join("up"));
        let tagged = up.head().unwrap().peel_to_commit().unwrap();
        up.tag_lightweight("v1", tagged.as_object(), false).unwrap();
        let dest = tmp.path().join("clone");
        let mut req = request(&tmp.path().join("up"), dest.clone());
        req.version = Some("v1".to_string());
        clone(&req).unwrap();

        let err = Git2Client
            .pull(
                &PullRequest {
                    repo: dest,
                    branch: None,
                },
                &Credential::anonymous(),
            )
            .unwrap_err();
        assert!(matches!(err, GitError::DetachedHead(_)));
    }

    #[test]
    fn head_state_of_non_repository_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Git2Client.head_state(tmp.path()).is_err());
    }
}
