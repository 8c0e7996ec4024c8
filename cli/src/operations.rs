//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the sync engine can be
//! exercised against fault-injecting doubles in tests.  Production code uses
//! [`SystemFileSystemOps`], which creates Unix symlinks; pinned clone labels
//! contain `:`, so recon targets Unix only.

use std::io;
use std::path::{Path, PathBuf};

/// What `lstat` reports for a path, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Nothing exists at the path.
    Missing,
    /// The path is a symbolic link (possibly dangling).
    Symlink,
    /// The path is a real directory.
    Dir,
    /// The path is a regular file or any other non-directory entry.
    File,
}

/// Abstraction over the filesystem primitives used by the sync engine.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns the immediate child paths inside `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Classify `path` without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns an error for any `lstat` failure other than "not found".
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Read the target of the symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Create a symbolic link at `link` pointing to `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn symlink(&self, source: &Path, link: &Path) -> io::Result<()>;

    /// Remove a file, symlink, or empty directory.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the tree cannot be removed.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` and all missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect()
    }

    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(EntryKind::Symlink),
            Ok(meta) if meta.is_dir() => Ok(EntryKind::Dir),
            Ok(_) => Ok(EntryKind::File),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
            Err(e) => Err(e),
        }
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn symlink(&self, source: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(source, link)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        // lstat: a link to a directory is removed as a file.
        if std::fs::symlink_metadata(path)?.is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// Fault-injecting [`FileSystemOps`] for unit tests.
///
/// Delegates to [`SystemFileSystemOps`] (so tests run against a real temp
/// directory) except for the paths registered through the builder methods,
/// whose operations fail with `PermissionDenied`.
///
/// ```ignore
/// let fs = FaultyFileSystemOps::new().fail_remove_dir_all(cache.join("old_repo"));
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FaultyFileSystemOps {
    fail_remove_dir_all: Vec<PathBuf>,
    fail_symlink: Vec<PathBuf>,
    fail_rename: Vec<PathBuf>,
    fail_read_dir: Vec<PathBuf>,
}

#[cfg(test)]
impl FaultyFileSystemOps {
    /// Create a double that behaves exactly like the real filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `remove_dir_all(path)` fail.
    #[must_use]
    pub fn fail_remove_dir_all(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_remove_dir_all.push(path.into());
        self
    }

    /// Make creating a symlink at `link` fail.
    #[must_use]
    pub fn fail_symlink(mut self, link: impl Into<PathBuf>) -> Self {
        self.fail_symlink.push(link.into());
        self
    }

    /// Make renaming `from` fail.
    #[must_use]
    pub fn fail_rename(mut self, from: impl Into<PathBuf>) -> Self {
        self.fail_rename.push(from.into());
        self
    }

    /// Make listing `path` fail.
    #[must_use]
    pub fn fail_read_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_read_dir.push(path.into());
        self
    }

    fn check(list: &[PathBuf], path: &Path) -> io::Result<()> {
        if list.iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected failure for {}", path.display()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
impl FileSystemOps for FaultyFileSystemOps {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        Self::check(&self.fail_read_dir, path)?;
        SystemFileSystemOps.read_dir(path)
    }

    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        SystemFileSystemOps.entry_kind(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        SystemFileSystemOps.read_link(path)
    }

    fn symlink(&self, source: &Path, link: &Path) -> io::Result<()> {
        Self::check(&self.fail_symlink, link)?;
        SystemFileSystemOps.symlink(source, link)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        SystemFileSystemOps.remove(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        Self::check(&self.fail_remove_dir_all, path)?;
        SystemFileSystemOps.remove_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        Self::check(&self.fail_rename, from)?;
        SystemFileSystemOps.rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        SystemFileSystemOps.create_dir_all(path)
    }
}
