//! Mapping sanitized keys to entry files under the cache root.
//!
//! Sanitization already removes traversal sequences. The resolver adds a
//! second check on the real filesystem: the canonical location of an entry
//! (or of its nearest existing ancestor) must sit under the canonical root.
//! This catches symlinks planted inside the cache directory.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CacheError, CacheResult};
use crate::key::SanitizedKey;

/// File extension of every cache entry.
pub const ENTRY_EXTENSION: &str = "txt";

#[derive(Debug, Clone)]
pub(crate) struct PathResolver {
    root: PathBuf,
    canonical_root: PathBuf,
}

impl PathResolver {
    /// The root must already exist.
    pub fn new(root: PathBuf) -> io::Result<Self> {
        let canonical_root = root.canonicalize()?;
        Ok(Self {
            root,
            canonical_root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<key>.txt`, without any filesystem check.
    pub fn entry_path(&self, key: &SanitizedKey) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        let mut name = path.into_os_string();
        name.push(".");
        name.push(ENTRY_EXTENSION);
        PathBuf::from(name)
    }

    /// Check an already computed path against the canonical root.
    pub fn verify(&self, path: &Path) -> CacheResult<()> {
        let anchor = nearest_existing(path)
            .ok_or_else(|| CacheError::UnauthorizedPath(path.to_path_buf()))?;
        let canonical = anchor
            .canonicalize()
            .map_err(|_| CacheError::UnauthorizedPath(path.to_path_buf()))?;
        if canonical.starts_with(&self.canonical_root) {
            Ok(())
        } else {
            Err(CacheError::UnauthorizedPath(path.to_path_buf()))
        }
    }

    /// Turn an entry file path back into its key, if it is one.
    pub fn key_for(&self, path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
            return None;
        }
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let segments = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(segments.join("/"))
    }
}

/// The path itself when it exists (symlinks included), else its closest
/// existing ancestor.
fn nearest_existing(path: &Path) -> Option<&Path> {
    let mut current = Some(path);
    while let Some(candidate) = current {
        if candidate.symlink_metadata().is_ok() {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}
