//! Domain-specific error types for the recon engine.
//!
//! Internal modules return typed errors built with [`thiserror`]; command
//! handlers at the CLI boundary convert them to [`anyhow::Error`] via the
//! standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ReconError
//! ├── Config(ConfigError)  recon.toml loading, validation, saving
//! ├── Sync(SyncError)      labeling, inventory, fetch and link phases
//! └── Git(GitError)        clone / pull / inspect through libgit2
//! ```

use thiserror::Error;

/// Top-level error type for the recon engine.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Configuration-related error (parsing, validation, I/O).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure in one of the sync phases.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Version-control operation failure.
    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

/// Errors that arise from loading, validating, or saving `recon.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read or written.
    #[error("IO error accessing config file {path}: {source}")]
    Io {
        /// Path to the config file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or does not match the schema.
    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        /// Path to the config file.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The config could not be serialized back to TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Neither `--home` nor `HOME` provided a home directory.
    #[error("cannot determine home directory: set HOME or pass --home")]
    MissingHome,

    /// A repository entry is malformed (empty fields, unusable name, bad remote).
    #[error("Invalid repo '{name}': {reason}")]
    InvalidRepo {
        /// Name of the offending entry (may be empty).
        name: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Two repository entries share the same name.
    #[error("Duplicate repo name '{0}' in config")]
    DuplicateName(String),

    /// Two distinct repository entries map to the same cache directory.
    #[error("Repos '{first}' and '{second}' both map to cache directory '{label}'")]
    LabelCollision {
        /// The shared labeled directory name.
        label: String,
        /// First entry using the label.
        first: String,
        /// Second entry using the label.
        second: String,
    },

    /// A repo's link would replace the directory holding recon's own state.
    #[error("Repo '{name}' would link over {path}, which holds recon.toml or the clone directory")]
    ReservedName {
        /// Name of the offending entry.
        name: String,
        /// The link path that contains recon's files.
        path: String,
    },
}

/// Errors raised by the reconciliation engine.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote string has no recognisable host/path separator.
    #[error("Malformed remote '{0}': expected <host>:<path> or <scheme>://<host>/<path>")]
    MalformedRemote(String),

    /// A filesystem operation on the cache or config root failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Cloning a repository failed.
    #[error("Failed to clone '{name}': {source}")]
    CloneFailure {
        /// Descriptor name.
        name: String,
        /// Underlying version-control error.
        source: GitError,
    },

    /// Renaming a conflicting entry or creating a symlink failed.
    #[error("Failed to link '{name}': {source}")]
    LinkFailure {
        /// Descriptor name.
        name: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The `--config` filter matched no descriptor.
    #[error("config '{0}' not found in recon.toml")]
    ConfigNotFound(String),

    /// The SSH credential needed for cloning could not be loaded.
    #[error("Cannot load credential: {0}")]
    Credential(GitError),

    /// Reading the user's answer from the terminal failed.
    #[error("Prompt failed: {0}")]
    Prompt(std::io::Error),

    /// The clone worker pool could not be started.
    #[error("Cannot start clone workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors raised by the version-control collaborator.
#[derive(Error, Debug)]
pub enum GitError {
    /// libgit2 reported an error.
    #[error(transparent)]
    Libgit(#[from] git2::Error),

    /// The private key file could not be read.
    #[error("cannot read SSH key {path}: {source}")]
    KeyFile {
        /// Path to the key file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// HEAD is detached and no branch was given.
    #[error("HEAD of {0} is detached; pass --branch to choose what to pull")]
    DetachedHead(String),

    /// The fetched branch cannot be fast-forwarded onto the local branch.
    #[error("branch '{0}' has diverged from origin; refusing to merge")]
    NotFastForward(String),
}
