//! Subcommand implementations.
//!
//! Each command exposes `run`, used by the binary with the real collaborators
//! and the run summary, and `execute`, which works on a prepared
//! [`CommandSetup`] so tests can inject doubles.
pub mod add;
pub mod config;
pub mod pull;
pub mod status;
pub mod sync;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::config::repo::RepoConfig;
use crate::config::{Paths, ReconConfig};
use crate::error::{ConfigError, SyncError};
use crate::git::{Git2Client, Vcs};
use crate::logging::Log;
use crate::operations::{EntryKind, FileSystemOps, SystemFileSystemOps};
use crate::prompt::{FixedAnswer, Prompt, TerminalPrompt};
use crate::sync::SyncContext;
use crate::sync::label::label;

/// Whether a command can work without a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigRequirement {
    /// A missing file is an error.
    Required,
    /// A missing file means an empty config.
    Optional,
}

/// State shared by every command: resolved paths, the loaded config, and the
/// collaborators the engine talks to.
pub struct CommandSetup {
    /// Home, config file and derived locations.
    pub paths: Paths,
    /// Validated contents of `recon.toml`, empty when the file is optional and absent.
    pub config: ReconConfig,
    /// Console and file logger.
    pub log: Arc<dyn Log>,
    /// Filesystem access used by the engine.
    pub fs: Arc<dyn FileSystemOps>,
    /// Git backend.
    pub vcs: Arc<dyn Vcs>,
    /// Answers the engine's yes/no questions.
    pub prompt: Arc<dyn Prompt>,
}

impl std::fmt::Debug for CommandSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSetup")
            .field("paths", &self.paths)
            .field("config", &self.config)
            .field("log", &"<dyn Log>")
            .field("fs", &self.fs)
            .field("vcs", &"<dyn Vcs>")
            .field("prompt", &"<dyn Prompt>")
            .finish()
    }
}

impl CommandSetup {
    /// Resolve paths from the global flags and load the config with the
    /// production collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory is known or the config cannot be
    /// loaded.
    pub fn init(
        global: &GlobalOpts,
        log: Arc<dyn Log>,
        requirement: ConfigRequirement,
    ) -> Result<Self> {
        let paths = Paths::resolve(global.home.clone(), global.config_file.clone())?;
        let prompt: Arc<dyn Prompt> = if global.yes {
            Arc::new(FixedAnswer(true))
        } else {
            Arc::new(TerminalPrompt)
        };
        Self::load(
            paths,
            log,
            Arc::new(Git2Client),
            prompt,
            Arc::new(SystemFileSystemOps),
            requirement,
        )
    }

    /// Load the config at `paths.config_file` and assemble a setup around the
    /// given collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be read, parsed, or validated.
    pub fn load(
        paths: Paths,
        log: Arc<dyn Log>,
        vcs: Arc<dyn Vcs>,
        prompt: Arc<dyn Prompt>,
        fs: Arc<dyn FileSystemOps>,
        requirement: ConfigRequirement,
    ) -> Result<Self> {
        log.stage("Loading configuration");
        log.debug(&format!("config: {}", paths.config_file.display()));

        let (config, warnings) = match ReconConfig::load(&paths.config_file) {
            Ok(loaded) => loaded,
            Err(ConfigError::Io { source, .. })
                if requirement == ConfigRequirement::Optional
                    && source.kind() == std::io::ErrorKind::NotFound =>
            {
                log.info("no config file yet, starting empty");
                (ReconConfig::default(), Vec::new())
            }
            Err(e) => return Err(e).context("loading recon.toml"),
        };
        paths
            .check_link_targets(&config)
            .context("loading recon.toml")?;

        if !warnings.is_empty() {
            let count = warnings.len();
            log.warn(&format!("found {count} configuration warning(s):"));
            for warning in &warnings {
                log.warn(&format!("  {warning}"));
            }
        }
        log.info(&format!("loaded {} repos", config.repos.len()));

        Ok(Self {
            paths,
            config,
            log,
            fs,
            vcs,
            prompt,
        })
    }

    /// Build the engine context for this setup.
    #[must_use]
    pub fn sync_context(&self) -> SyncContext {
        SyncContext {
            log: Arc::clone(&self.log),
            fs: Arc::clone(&self.fs),
            vcs: Arc::clone(&self.vcs),
            prompt: Arc::clone(&self.prompt),
            cache_root: self.paths.cache_root(&self.config),
            config_root: self.paths.config_root(),
            ssh_key: self.paths.ssh_key(&self.config),
        }
    }

    /// Create the cache root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_cache_root(&self) -> Result<PathBuf> {
        let root = self.paths.cache_root(&self.config);
        if self.fs.entry_kind(&root)? == EntryKind::Missing {
            let msg = format!("creating clone directory {}", root.display());
            self.log.info(&msg);
            self.fs
                .create_dir_all(&root)
                .with_context(|| format!("creating {}", root.display()))?;
        }
        Ok(root)
    }

    /// Find a configured repository and the path of its clone.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigNotFound`] if no entry has that name.
    pub fn locate(&self, name: &str) -> Result<(&RepoConfig, PathBuf)> {
        let repo = self
            .config
            .find(name)
            .ok_or_else(|| SyncError::ConfigNotFound(name.to_string()))?;
        let dir = self.paths.cache_root(&self.config).join(label(repo)?);
        Ok((repo, dir))
    }
}
