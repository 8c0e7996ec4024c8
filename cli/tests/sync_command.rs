#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `sync` command.
//!
//! Each test loads a real `recon.toml` from a temporary home directory and
//! drives [`commands::sync::execute`] with an in-memory version-control double
//! and scripted prompt answers.

mod common;

use std::fs;
use std::sync::Arc;

use common::*;
use recon_cli::cli::SyncOpts;
use recon_cli::commands::{self, ConfigRequirement};
use recon_cli::error::SyncError;
use recon_cli::logging::PhaseStatus;

const TMUX: &str = r#"
[[repos]]
name = "tmux"
remote = "git@github.com:user/tmux-conf.git"
"#;

const TWO_REPOS: &str = r#"
[[repos]]
name = "tmux"
remote = "git@github.com:user/tmux-conf.git"

[[repos]]
name = "nvim"
remote = "git@github.com:user/dots.git"
branch = "main"
path = "nvim"
"#;

fn sync_opts() -> SyncOpts {
    SyncOpts::default()
}

// ---------------------------------------------------------------------------
// First sync and idempotence
// ---------------------------------------------------------------------------

#[test]
fn first_sync_clones_and_links_tmux() {
    let home = TestHome::new().with_config(TMUX);
    let setup = home.unattended();

    let summary = commands::sync::execute(&setup, &sync_opts()).unwrap();

    let clone = home.cache_root().join("user_tmux_conf");
    assert!(clone.is_dir());
    assert!(links_to(&home.config_root().join("tmux"), &clone));
    assert_eq!(summary.fetch.cloned, 1);
    assert_eq!(summary.reconcile.linked, 1);
}

#[test]
fn resync_is_idempotent() {
    let home = TestHome::new().with_config(TWO_REPOS);
    let prompt = Arc::new(ScriptedPrompt::default());
    commands::sync::execute(&home.setup(prompt.clone()), &sync_opts()).unwrap();

    let second = commands::sync::execute(&home.setup(prompt.clone()), &sync_opts()).unwrap();

    assert_eq!(second.fetch.cloned, 0);
    assert_eq!(second.reconcile.linked, 0);
    assert_eq!(second.reconcile.already_correct, 2);
    assert_eq!(home.vcs.clones().len(), 2, "no clone on the second run");
    assert!(prompt.questions().is_empty());
}

#[test]
fn branch_repo_links_to_subpath_of_labeled_clone() {
    let home = TestHome::new().with_config(TWO_REPOS);
    commands::sync::execute(&home.unattended(), &sync_opts()).unwrap();

    let clones = home.vcs.clones();
    let nvim = clones
        .iter()
        .find(|c| c.remote.ends_with("dots.git"))
        .expect("nvim clone requested");
    assert_eq!(nvim.branch.as_deref(), Some("main"));
    assert!(nvim.destination.ends_with("user_dots-branch:main"));
    assert!(links_to(
        &home.config_root().join("nvim"),
        &home.cache_root().join("user_dots-branch:main").join("nvim")
    ));
}

#[test]
fn missing_cache_root_is_created() {
    let home = TestHome::new().with_config(TMUX);
    fs::remove_dir(home.cache_root()).unwrap();

    commands::sync::execute(&home.unattended(), &sync_opts()).unwrap();

    assert!(home.cache_root().join("user_tmux_conf").is_dir());
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

#[test]
fn declined_conflict_leaves_file_and_continues() {
    let home = TestHome::new().with_config(TWO_REPOS);
    let existing = home.config_root().join("tmux");
    fs::write(&existing, "set -g mouse on").unwrap();
    let prompt = Arc::new(ScriptedPrompt::answering(&[false]));

    let summary = commands::sync::execute(&home.setup(prompt.clone()), &sync_opts()).unwrap();

    assert_eq!(fs::read_to_string(&existing).unwrap(), "set -g mouse on");
    assert!(fs::symlink_metadata(&existing).unwrap().is_file());
    assert_eq!(summary.reconcile.skipped, 1);
    assert_eq!(summary.reconcile.linked, 1, "nvim is still linked");
    assert_eq!(prompt.questions().len(), 1);
    assert!(prompt.questions()[0].contains(".tmux-old"));
}

#[test]
fn accepted_conflict_moves_directory_aside() {
    let home = TestHome::new().with_config(TMUX);
    let existing = home.config_root().join("tmux");
    fs::create_dir(&existing).unwrap();
    fs::write(existing.join("tmux.conf"), "old").unwrap();

    commands::sync::execute(
        &home.setup(Arc::new(ScriptedPrompt::answering(&[true]))),
        &sync_opts(),
    )
    .unwrap();

    let clone = home.cache_root().join("user_tmux_conf");
    assert!(links_to(&existing, &clone));
    assert_eq!(
        fs::read_to_string(home.config_root().join(".tmux-old/tmux.conf")).unwrap(),
        "old"
    );
}

// ---------------------------------------------------------------------------
// Clean
// ---------------------------------------------------------------------------

#[test]
fn clean_deletes_orphan_after_one_confirmation() {
    let home = TestHome::new().with_config(TMUX);
    fs::create_dir(home.cache_root().join("old_repo")).unwrap();
    fs::create_dir(home.cache_root().join("older_repo")).unwrap();
    let prompt = Arc::new(ScriptedPrompt::answering(&[true]));

    let summary = commands::sync::execute(
        &home.setup(prompt.clone()),
        &SyncOpts {
            config: None,
            clean: true,
        },
    )
    .unwrap();

    assert_eq!(summary.fetch.pruned, 2);
    assert!(!home.cache_root().join("old_repo").exists());
    assert!(!home.cache_root().join("older_repo").exists());
    assert_eq!(prompt.questions().len(), 1);
    assert!(links_to(
        &home.config_root().join("tmux"),
        &home.cache_root().join("user_tmux_conf")
    ));
}

#[test]
fn clean_without_flag_never_asks() {
    let home = TestHome::new().with_config(TMUX);
    fs::create_dir(home.cache_root().join("old_repo")).unwrap();
    let prompt = Arc::new(ScriptedPrompt::default());

    commands::sync::execute(&home.setup(prompt.clone()), &sync_opts()).unwrap();

    assert!(home.cache_root().join("old_repo").exists());
    assert!(prompt.questions().is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn clone_failure_names_the_repo_and_skips_linking() {
    let home = TestHome::with_vcs(FakeVcs::new().failing("git@github.com:user/dots.git"))
        .with_config(TWO_REPOS);

    let setup = home.unattended();
    let err = commands::sync::execute(&setup, &sync_opts()).unwrap_err();

    let sync_err = err.downcast_ref::<SyncError>().expect("typed sync error");
    assert!(matches!(sync_err, SyncError::CloneFailure { name, .. } if name == "nvim"));
    assert_eq!(home.vcs.clones().len(), 2, "sibling clone still ran");
    let tmux = home.config_root().join("tmux");
    assert!(fs::symlink_metadata(tmux).is_err());
    let phases = home.log.phases();
    assert_eq!(phases.last().unwrap().name, "Fetch repositories");
    assert_eq!(phases.last().unwrap().status, PhaseStatus::Failed);
}

#[test]
fn unknown_config_filter_fails() {
    let home = TestHome::new().with_config(TMUX);

    let err = commands::sync::execute(
        &home.unattended(),
        &SyncOpts {
            config: Some("zsh".to_string()),
            clean: false,
        },
    )
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<SyncError>().unwrap().to_string(),
        "config 'zsh' not found in recon.toml"
    );
}

#[test]
fn missing_ssh_key_fails_when_cloning() {
    let home = TestHome::new().with_config(TMUX);
    fs::remove_file(home.home().join(".ssh/id_rsa")).unwrap();

    let setup = home.unattended();
    let err = commands::sync::execute(&setup, &sync_opts()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Credential(_))
    ));
    assert!(home.vcs.clones().is_empty());
}

#[test]
fn duplicate_names_are_rejected_at_load() {
    let home = TestHome::new().with_config(
        r#"
[[repos]]
name = "tmux"
remote = "git@github.com:user/a.git"

[[repos]]
name = "tmux"
remote = "git@github.com:user/b.git"
"#,
    );

    let err = home.try_unattended(ConfigRequirement::Required).unwrap_err();

    assert!(format!("{err:#}").contains("Duplicate repo name 'tmux'"));
}

#[test]
fn repo_named_after_recon_directory_is_rejected_at_load() {
    let home = TestHome::new().with_config(
        r#"
[[repos]]
name = "recon"
remote = "git@github.com:user/recon-conf.git"
"#,
    );
    fs::create_dir_all(home.cache_root().join("user_tmux_conf")).unwrap();

    let err = home.try_unattended(ConfigRequirement::Required).unwrap_err();

    assert!(format!("{err:#}").contains("Repo 'recon' would link over"));
    assert!(home.config_file().is_file());
    assert!(home.cache_root().join("user_tmux_conf").is_dir());
    assert!(!home.config_root().join(".recon-old").exists());
}
