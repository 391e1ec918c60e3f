//! Configuration for the file cache.
//!
//! This module provides a builder for the cache root, the bypass switch and
//! the default TTL used by [`crate::CacheStore::get_default`].

use std::path::{Path, PathBuf};

use crate::entry::Ttl;

/// Environment variable naming the default cache root.
pub const ENV_CACHE_DIR: &str = "SIMPLE_FILE_CACHE_DIR";

/// Environment variable that turns bypass on when set to `1` or `true`.
pub const ENV_BYPASS: &str = "SIMPLE_FILE_CACHE_BYPASS";

/// Root used when nothing else is configured, relative to the working directory.
pub const DEFAULT_ROOT: &str = "cache";

/// Configuration for creating a new cache store.
///
/// ```
/// use simple_file_cache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::new()
///     .root("/tmp/my-app-cache")
///     .default_ttl(Duration::from_secs(300))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding every entry file.
    pub(crate) root: PathBuf,

    /// Initial state of the bypass switch.
    pub(crate) bypass: bool,

    /// TTL applied by `get_default`.
    pub(crate) default_ttl: Ttl,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            bypass: false,
            default_ttl: Ttl::Never,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `SIMPLE_FILE_CACHE_DIR` and
    /// `SIMPLE_FILE_CACHE_BYPASS`.
    pub fn from_env() -> Self {
        let bypass = std::env::var(ENV_BYPASS)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self::default().bypass(bypass)
    }

    /// Set the cache root directory.
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    /// Start the store with bypass on or off.
    ///
    /// While bypassed, every read is a miss.
    pub fn bypass(mut self, enabled: bool) -> Self {
        self.bypass = enabled;
        self
    }

    /// Set the default TTL. `Duration::ZERO` means entries never expire.
    pub fn default_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.default_ttl = ttl.into();
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    pub fn get_bypass(&self) -> bool {
        self.bypass
    }

    pub fn get_default_ttl(&self) -> Ttl {
        self.default_ttl
    }
}

fn default_root() -> PathBuf {
    std::env::var_os(ENV_CACHE_DIR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
}
