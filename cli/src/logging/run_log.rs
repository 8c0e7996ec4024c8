//! Where a command's run log lives and how each run starts it.
use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

/// Directory holding run logs: `$XDG_CACHE_HOME/recon`, else `<home>/.cache/recon`.
///
/// Returns `None` when neither is known. An empty `XDG_CACHE_HOME` counts as
/// unset.
fn log_dir(xdg_cache_home: Option<OsString>, home: Option<&Path>) -> Option<PathBuf> {
    let cache = xdg_cache_home
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|h| h.join(".cache")))?;
    Some(cache.join("recon"))
}

/// Path of the run log for `command`.
///
/// `home` is the `--home` override; without it `$HOME` is used, so the log
/// follows the same home as the config it describes.
#[must_use]
pub fn log_file_for(home: Option<&Path>, command: &str) -> Option<PathBuf> {
    let env_home = std::env::var_os("HOME").map(PathBuf::from);
    let home = home.map(Path::to_path_buf).or(env_home);
    let dir = log_dir(std::env::var_os("XDG_CACHE_HOME"), home.as_deref())?;
    Some(dir.join(format!("{command}.log")))
}

/// Where the previous run's log is kept: `<command>.log.old`.
pub(super) fn previous_run(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".old");
    path.with_file_name(name)
}

/// First line of every run log.
pub(super) fn header(command: &str, started: DateTime<Utc>) -> String {
    let version =
        option_env!("RECON_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
    let started = started.format("%Y-%m-%d %H:%M:%S");
    format!("# recon {version} {command}, started {started} UTC\n")
}

/// Start a fresh log at `path`, moving the previous run to
/// [`previous_run`] and writing `header`.
pub(super) fn start(path: &Path, header: &str) -> io::Result<fs::File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    if path.exists() {
        fs::rename(path, previous_run(path))?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(header.as_bytes())?;
    Ok(file)
}
