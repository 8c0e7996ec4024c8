//! Personal config synchronizer.
//!
//! `recon` maps named entries under `~/.config` to git repositories listed in
//! `~/.config/recon/recon.toml`, keeps one clone per repository in a local
//! cache, and points each config entry at its clone with a symlink.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]** parses and validates `recon.toml`
//! - **[`sync`]** is the reconciliation engine (labeling, inventory, fetch, link)
//! - **[`git`]**, **[`operations`]** and **[`prompt`]** are the injectable
//!   collaborators the engine talks to
//! - **[`commands`]** wires everything up for each subcommand
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

#[cfg(not(unix))]
compile_error!("recon links configs with Unix symlinks");

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod operations;
pub mod prompt;
pub mod sync;
