//! Local cache inventory.
use std::collections::BTreeSet;
use std::path::Path;

use super::io_error;
use crate::error::SyncError;
use crate::operations::{EntryKind, FileSystemOps};

/// Names of the immediate subdirectories of `cache_root`.
///
/// Files and symlinks are ignored. The cache root is never created here.
///
/// # Errors
///
/// Returns [`SyncError::Io`] if `cache_root` cannot be listed or an entry
/// cannot be inspected.
pub fn scan(fs: &dyn FileSystemOps, cache_root: &Path) -> Result<BTreeSet<String>, SyncError> {
    let mut names = BTreeSet::new();
    for entry in fs.read_dir(cache_root).map_err(io_error(cache_root))? {
        if fs.entry_kind(&entry).map_err(io_error(&entry))? != EntryKind::Dir {
            continue;
        }
        if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}
