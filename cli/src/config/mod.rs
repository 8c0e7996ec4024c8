//! `recon.toml` loading, validation, and path resolution.
pub mod repo;
pub mod toml_loader;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use repo::RepoConfig;
use validation::{ValidationWarning, validate_repos};

/// Location of the config file relative to the home directory.
pub const CONFIG_FILE: &str = ".config/recon/recon.toml";

/// Default clone directory relative to the home directory.
pub const DEFAULT_CLONE_DIR: &str = ".config/recon/git-dirs/";

/// Default SSH private key relative to the home directory.
pub const DEFAULT_SSH_KEY: &str = ".ssh/id_rsa";

/// Directory, relative to home, where config links are created.
pub const CONFIG_ROOT: &str = ".config";

/// The parsed contents of `recon.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Where repositories are cloned; relative to home unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_dir: Option<String>,

    /// SSH private key used for cloning; relative to home unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,

    /// Repositories to sync, in declaration order.
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

impl ReconConfig {
    /// Load and validate the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any repo
    /// entry fails validation.
    pub fn load(path: &Path) -> Result<(Self, Vec<ValidationWarning>), ConfigError> {
        let config: Self = toml_loader::load_config(path)?;
        let warnings = validate_repos(&config.repos)?;
        Ok((config, warnings))
    }

    /// Write the config to `path` as pretty-printed TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        toml_loader::save_config(path, self)
    }

    /// Look up a repo entry by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&RepoConfig> {
        self.repos.iter().find(|r| r.name == name)
    }

    /// Append `repo`, keeping the entry list valid.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving `self` unchanged, if the new entry is invalid
    /// or clashes with an existing one.
    pub fn add_repo(&mut self, repo: RepoConfig) -> Result<Vec<ValidationWarning>, ConfigError> {
        self.repos.push(repo);
        match validate_repos(&self.repos) {
            Ok(warnings) => Ok(warnings),
            Err(e) => {
                self.repos.pop();
                Err(e)
            }
        }
    }
}

/// Filesystem locations a command works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// The user's home directory.
    pub home: PathBuf,
    /// The `recon.toml` in use.
    pub config_file: PathBuf,
}

impl Paths {
    /// Resolve paths from command-line overrides, falling back to `$HOME` and
    /// `~/.config/recon/recon.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHome`] if no home directory is known.
    pub fn resolve(
        home: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |h: &PathBuf| !h.as_os_str().is_empty();
        let env_home = std::env::var_os("HOME").map(PathBuf::from);
        let home = home
            .filter(non_empty)
            .or_else(|| env_home.filter(non_empty))
            .ok_or(ConfigError::MissingHome)?;
        let config_file = config_file.unwrap_or_else(|| home.join(CONFIG_FILE));
        Ok(Self { home, config_file })
    }

    /// Directory holding the live config links (`~/.config`).
    #[must_use]
    pub fn config_root(&self) -> PathBuf {
        self.home.join(CONFIG_ROOT)
    }

    /// Directory holding one clone per labeled repository.
    #[must_use]
    pub fn cache_root(&self, config: &ReconConfig) -> PathBuf {
        self.under_home(config.clone_dir.as_deref(), DEFAULT_CLONE_DIR)
    }

    /// Private key file used to authenticate clones.
    #[must_use]
    pub fn ssh_key(&self, config: &ReconConfig) -> PathBuf {
        self.under_home(config.ssh_key.as_deref(), DEFAULT_SSH_KEY)
    }

    /// Reject entries whose link would sit on top of the config file or the
    /// cache root, since replacing it would move recon's own state away.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReservedName`] for the first such entry.
    pub fn check_link_targets(&self, config: &ReconConfig) -> Result<(), ConfigError> {
        let config_root = self.config_root();
        let cache_root = self.cache_root(config);
        for repo in &config.repos {
            let link = config_root.join(&repo.name);
            if cache_root.starts_with(&link) || self.config_file.starts_with(&link) {
                return Err(ConfigError::ReservedName {
                    name: repo.name.clone(),
                    path: link.display().to_string(),
                });
            }
        }
        Ok(())
    }

    fn under_home(&self, value: Option<&str>, default: &str) -> PathBuf {
        let value = value.filter(|v| !v.trim().is_empty()).unwrap_or(default);
        let relative = value
            .strip_prefix("~/")
            .unwrap_or(value)
            .trim_end_matches('/');
        // `join` replaces the base when `relative` is absolute.
        self.home.join(relative)
    }
}
