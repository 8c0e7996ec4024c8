// Shared helpers for integration tests.
//
// Provides a temporary home directory with a `recon.toml`, plus in-memory
// doubles for the version-control, prompt and logging collaborators so each
// test can drive a command end to end without touching the network.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use recon_cli::commands::{CommandSetup, ConfigRequirement};
use recon_cli::config::Paths;
use recon_cli::error::GitError;
use recon_cli::git::{
    CloneOutcome, CloneRequest, Credential, HeadState, PullOutcome, PullRequest, Vcs,
};
use recon_cli::logging::{Log, PhaseEntry, PhaseStatus};
use recon_cli::operations::SystemFileSystemOps;
use recon_cli::prompt::Prompt;

/// Version-control double: clones create the destination directory and are
/// recorded; remotes registered with [`FakeVcs::failing`] return an error.
#[derive(Default)]
pub struct FakeVcs {
    clones: Mutex<Vec<CloneRequest>>,
    failing: HashSet<String>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make clones of `remote` fail.
    pub fn failing(mut self, remote: &str) -> Self {
        self.failing.insert(remote.to_string());
        self
    }

    /// Every clone requested so far.
    pub fn clones(&self) -> Vec<CloneRequest> {
        self.clones.lock().expect("clones lock").clone()
    }
}

impl Vcs for FakeVcs {
    fn clone_repo(
        &self,
        request: &CloneRequest,
        _credential: &Credential,
    ) -> Result<CloneOutcome, GitError> {
        self.clones
            .lock()
            .expect("clones lock")
            .push(request.clone());
        if self.failing.contains(&request.remote) {
            return Err(git2::Error::from_str("could not resolve host").into());
        }
        std::fs::create_dir_all(&request.destination).expect("create clone dir");
        Ok(CloneOutcome::Cloned)
    }

    fn pull(
        &self,
        _request: &PullRequest,
        _credential: &Credential,
    ) -> Result<PullOutcome, GitError> {
        Ok(PullOutcome::UpToDate)
    }

    fn head_state(&self, _repo: &Path) -> Result<HeadState, GitError> {
        Ok(HeadState {
            commit: "abc1234".to_string(),
            branch: Some("main".to_string()),
            tag: None,
        })
    }
}

/// Prompt double that replays scripted answers and records every question.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().expect("questions lock").clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask_yes_no(&self, message: &str) -> io::Result<bool> {
        self.questions
            .lock()
            .expect("questions lock")
            .push(message.to_string());
        self.answers
            .lock()
            .expect("answers lock")
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }
}

/// Log double that keeps every message in memory.
#[derive(Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    phases: Mutex<Vec<PhaseEntry>>,
}

impl MemoryLog {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .expect("lines lock")
            .iter()
            .any(|l| l.contains(needle))
    }

    pub fn phases(&self) -> Vec<PhaseEntry> {
        self.phases.lock().expect("phases lock").clone()
    }

    fn push(&self, msg: &str) {
        self.lines.lock().expect("lines lock").push(msg.to_string());
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(msg);
    }
    fn info(&self, msg: &str) {
        self.push(msg);
    }
    fn debug(&self, msg: &str) {
        self.push(msg);
    }
    fn warn(&self, msg: &str) {
        self.push(msg);
    }
    fn error(&self, msg: &str) {
        self.push(msg);
    }
    fn record_phase(&self, name: &str, status: PhaseStatus, message: Option<&str>) {
        self.phases.lock().expect("phases lock").push(PhaseEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}

/// An isolated home directory backed by a [`tempfile::TempDir`].
///
/// Contains `.config/recon/git-dirs/` and a dummy `.ssh/id_rsa`.
pub struct TestHome {
    pub dir: tempfile::TempDir,
    pub vcs: Arc<FakeVcs>,
    pub log: Arc<MemoryLog>,
}

impl TestHome {
    pub fn new() -> Self {
        Self::with_vcs(FakeVcs::new())
    }

    pub fn with_vcs(vcs: FakeVcs) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join(".config/recon/git-dirs"))
            .expect("create cache root");
        std::fs::create_dir_all(dir.path().join(".ssh")).expect("create .ssh");
        std::fs::write(dir.path().join(".ssh/id_rsa"), "test key").expect("write key");
        Self {
            dir,
            vcs: Arc::new(vcs),
            log: Arc::new(MemoryLog::default()),
        }
    }

    pub fn home(&self) -> &Path {
        self.dir.path()
    }

    pub fn cache_root(&self) -> PathBuf {
        self.home().join(".config/recon/git-dirs")
    }

    pub fn config_root(&self) -> PathBuf {
        self.home().join(".config")
    }

    pub fn config_file(&self) -> PathBuf {
        self.home().join(".config/recon/recon.toml")
    }

    /// Write `content` as the `recon.toml`.
    pub fn with_config(self, content: &str) -> Self {
        std::fs::write(self.config_file(), content).expect("write recon.toml");
        self
    }

    /// Load a command setup wired to this home and the in-memory doubles.
    pub fn setup(&self, prompt: Arc<dyn Prompt>) -> CommandSetup {
        self.try_setup(prompt, ConfigRequirement::Required)
            .expect("load setup")
    }

    /// Setup whose prompt has no answers, so any question fails the command.
    pub fn unattended(&self) -> CommandSetup {
        self.setup(Arc::new(ScriptedPrompt::default()))
    }

    pub fn try_unattended(&self, requirement: ConfigRequirement) -> anyhow::Result<CommandSetup> {
        self.try_setup(Arc::new(ScriptedPrompt::default()), requirement)
    }

    pub fn try_setup(
        &self,
        prompt: Arc<dyn Prompt>,
        requirement: ConfigRequirement,
    ) -> anyhow::Result<CommandSetup> {
        let paths = Paths::resolve(Some(self.home().to_path_buf()), None)?;
        CommandSetup::load(
            paths,
            self.log.clone(),
            self.vcs.clone(),
            prompt,
            Arc::new(SystemFileSystemOps),
            requirement,
        )
    }
}

/// Whether `path` is a symlink pointing at `target`.
pub fn links_to(path: &Path, target: &Path) -> bool {
    std::fs::read_link(path).is_ok_and(|t| t == target)
}
