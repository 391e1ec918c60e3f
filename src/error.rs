//! Error types for the file cache.
//!
//! Reads never surface these: a failed `get` is a miss. Mutating operations
//! (`set`, `delete`, `clear`) and construction return them to the caller.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The main error type for cache operations.
#[derive(Debug)]
pub enum CacheError {
    /// The cache root could not be created or is not writable.
    Configuration { path: PathBuf, reason: String },

    /// The key is empty after sanitization or otherwise unusable.
    InvalidKey(String),

    /// The resolved path would land outside the cache root.
    UnauthorizedPath(PathBuf),

    /// A parent directory for an entry could not be created.
    Directory { path: PathBuf, source: io::Error },

    /// A read, write or delete failed at the filesystem layer.
    Io { path: PathBuf, source: io::Error },

    /// The value could not be encoded.
    Serialization(serde_json::Error),

    /// Stored bytes could not be decoded into the requested value.
    Deserialization(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the stored bytes are unusable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, CacheError::Deserialization(_))
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Configuration { path, reason } => {
                write!(f, "cache root '{}' is unusable: {}", path.display(), reason)
            }
            CacheError::InvalidKey(key) => write!(f, "invalid key: '{}'", key),
            CacheError::UnauthorizedPath(path) => {
                write!(f, "path escapes cache root: '{}'", path.display())
            }
            CacheError::Directory { path, source } => {
                write!(f, "failed to create directory '{}': {}", path.display(), source)
            }
            CacheError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path.display(), source)
            }
            CacheError::Serialization(err) => write!(f, "serialization error: {}", err),
            CacheError::Deserialization(msg) => write!(f, "deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Directory { source, .. } | CacheError::Io { source, .. } => Some(source),
            CacheError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err)
    }
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = CacheError::InvalidKey("..".to_string());
        assert_eq!(format!("{}", err), "invalid key: '..'");

        let err = CacheError::UnauthorizedPath(PathBuf::from("/etc/passwd.txt"));
        assert_eq!(
            format!("{}", err),
            "path escapes cache root: '/etc/passwd.txt'"
        );

        let err = CacheError::Configuration {
            path: PathBuf::from("/nope"),
            reason: "read-only".to_string(),
        };
        assert_eq!(format!("{}", err), "cache root '/nope' is unusable: read-only");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = CacheError::io("/cache/a.txt", io_err);
        assert!(matches!(err, CacheError::Io { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_corruption_classification() {
        assert!(CacheError::Deserialization("bad".to_string()).is_corruption());
        assert!(!CacheError::InvalidKey("k".to_string()).is_corruption());
    }
}
