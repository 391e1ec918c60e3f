//! Filesystem access for entry files.
//!
//! Writers take an exclusive advisory lock on the destination before
//! truncating it. Readers never lock. A reader racing a writer may see the
//! old content, the new content, or an empty/partial file; callers treat the
//! latter as corruption. The write is not crash-atomic: a crash between
//! truncate and the final byte leaves a short file behind.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::path::ENTRY_EXTENSION;

const WRITE_PROBE: &str = ".write-probe";

/// Create the root (parents first) and prove it is writable.
pub(crate) fn bootstrap_root(root: &Path) -> CacheResult<()> {
    let config_err = |reason: String| CacheError::Configuration {
        path: root.to_path_buf(),
        reason,
    };

    fs::create_dir_all(root).map_err(|e| config_err(format!("cannot create directory: {}", e)))?;
    if !root.is_dir() {
        return Err(config_err("not a directory".to_string()));
    }

    let probe = root.join(format!("{}-{}", WRITE_PROBE, std::process::id()));
    File::create(&probe).map_err(|e| config_err(format!("not writable: {}", e)))?;
    if let Err(e) = fs::remove_file(&probe) {
        warn!(path = %probe.display(), error = %e, "Failed to remove write probe");
    }
    Ok(())
}

/// Create every missing directory above `path`.
pub(crate) fn ensure_parent(path: &Path) -> CacheResult<()> {
    match path.parent() {
        Some(parent) if !parent.is_dir() => {
            fs::create_dir_all(parent).map_err(|source| CacheError::Directory {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Read a whole entry file without locking.
pub(crate) fn read(path: &Path) -> io::Result<Bytes> {
    fs::read(path).map(Bytes::from)
}

/// Replace the content of `path` while holding an exclusive lock on it.
///
/// The file is opened without truncation so the lock is held before any
/// byte of the previous content is discarded.
pub(crate) fn write_locked(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.lock_exclusive()?;

    let result = (|| {
        file.set_len(0)?;
        file.write_all(data)?;
        file.flush()
    })();

    if let Err(e) = FileExt::unlock(&file) {
        debug!(path = %path.display(), error = %e, "Failed to release entry lock");
    }
    result
}

/// Delete an entry file. A file that is already gone is not an error.
///
/// Returns whether this call removed it.
pub(crate) fn remove(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Delete an entry file, logging instead of failing.
pub(crate) fn remove_best_effort(path: &Path) -> bool {
    match remove(path) {
        Ok(removed) => removed,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete cache entry");
            false
        }
    }
}

/// Every regular entry file below `root`, depth first.
///
/// Symlinks are never followed. Directories that vanish or cannot be read
/// mid-walk are skipped.
pub(crate) fn walk_entries(root: &Path) -> CacheResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    let mut first = true;

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if first => return Err(CacheError::io(dir, e)),
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };
        first = false;

        for entry in entries.flatten() {
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(_) => continue,
            };
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && is_entry_file(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn is_entry_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION)
}
