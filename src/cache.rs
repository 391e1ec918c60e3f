//! The main cache interface.
//!
//! [`CacheStore`] ties the pieces together. Every call goes key sanitization,
//! then path resolution, then (for reads) the expiry check, then the file
//! backend, with the codec on the value boundary.
//!
//! Reads never fail: anything wrong with an entry is a miss, and entries that
//! are expired, empty or undecodable are deleted on the way out. Writes and
//! invalidations return [`CacheResult`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::codec;
use crate::config::CacheConfig;
use crate::entry::{self, Ttl};
use crate::error::{CacheError, CacheResult};
use crate::key::SanitizedKey;
use crate::path::PathResolver;
use crate::stats::{CacheStats, StatsSnapshot};
use crate::storage;

/// Pattern used by [`CacheStore::clear_default`].
pub const DEFAULT_PATTERN: &str = "*";

/// Per-call read settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Maximum age of the entry.
    pub ttl: Ttl,
    /// Override the store's bypass switch for this call only.
    pub bypass: Option<bool>,
}

impl ReadOptions {
    pub fn ttl(ttl: impl Into<Ttl>) -> Self {
        Self {
            ttl: ttl.into(),
            bypass: None,
        }
    }

    pub fn bypass(mut self, bypass: bool) -> Self {
        self.bypass = Some(bypass);
        self
    }
}

/// A filesystem-backed key-value cache.
///
/// # Example
/// ```
/// use simple_file_cache::{CacheConfig, CacheStore, Ttl};
///
/// let dir = tempfile::tempdir().unwrap();
/// let cache = CacheStore::new(CacheConfig::new().root(dir.path())).unwrap();
///
/// cache.set("user/123", &"Alice").unwrap();
/// let name: Option<String> = cache.get("user/123", Ttl::minutes(5.0));
/// assert_eq!(name.as_deref(), Some("Alice"));
///
/// cache.clear("user/*").unwrap();
/// assert!(cache.get::<String>("user/123", Ttl::Never).is_none());
/// ```
#[derive(Debug)]
pub struct CacheStore {
    resolver: PathResolver,
    config: CacheConfig,
    bypass: AtomicBool,
    stats: Arc<CacheStats>,
}

impl CacheStore {
    /// Create a store, creating the root directory if needed.
    ///
    /// Fails with [`CacheError::Configuration`] when the root cannot be
    /// created or written to.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        storage::bootstrap_root(&config.root)?;
        let resolver =
            PathResolver::new(config.root.clone()).map_err(|e| CacheError::Configuration {
                path: config.root.clone(),
                reason: format!("cannot resolve root: {}", e),
            })?;

        debug!(root = %config.root.display(), bypass = config.bypass, "Opened file cache");

        Ok(Self {
            resolver,
            bypass: AtomicBool::new(config.bypass),
            config,
            stats: Arc::new(CacheStats::new()),
        })
    }

    /// Create a store rooted at `root` with default settings.
    pub fn open(root: impl AsRef<Path>) -> CacheResult<Self> {
        Self::new(CacheConfig::new().root(root))
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Turn bypass on or off. While on, every read is a miss.
    pub fn set_bypass(&self, enabled: bool) {
        self.bypass.store(enabled, Ordering::Relaxed);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass.load(Ordering::Relaxed)
    }

    /// Read a value, treating entries older than `ttl` as stale.
    ///
    /// Returns `None` on a miss, which includes bypass, invalid keys, expired
    /// or corrupt entries, and a stored value that does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: impl Into<Ttl>) -> Option<T> {
        self.get_with(key, ReadOptions::ttl(ttl))
    }

    /// Read a value using the configured default TTL.
    pub fn get_default<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key, self.config.default_ttl)
    }

    /// Read a value with per-call options.
    pub fn get_with<T: DeserializeOwned>(&self, key: &str, options: ReadOptions) -> Option<T> {
        let value = self.lookup(key, options);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str, options: ReadOptions) -> Option<T> {
        if options.bypass.unwrap_or_else(|| self.is_bypassed()) {
            return None;
        }

        let path = self.resolve_for_read(key)?;

        if entry::is_expired(path.metadata(), options.ttl) {
            if storage::remove_best_effort(&path) {
                debug!(key, "Removed expired cache entry");
                self.stats.record_expiration();
                self.stats.record_deletes(1);
            }
            return None;
        }

        let bytes = match storage::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(key, error = %e, "Cache entry unreadable");
                self.evict_corrupt(key, &path);
                return None;
            }
        };

        let payload = match codec::decode_envelope(&bytes) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Cache entry is corrupt");
                self.evict_corrupt(key, &path);
                return None;
            }
        };

        match codec::from_payload(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Cached value has a different type than requested");
                None
            }
        }
    }

    /// Whether a fresh entry exists for `key`. The payload is not decoded.
    pub fn contains(&self, key: &str, ttl: impl Into<Ttl>) -> bool {
        if self.is_bypassed() {
            return false;
        }
        match self.resolve_for_read(key) {
            Some(path) => path.is_file() && !entry::is_expired(path.metadata(), ttl.into()),
            None => false,
        }
    }

    /// Store a value under `key`, replacing any previous entry.
    ///
    /// The value is encoded before anything touches the disk, so an
    /// unencodable value leaves the previous entry intact.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let key = self.sanitize(key, SanitizedKey::new)?;
        let bytes = codec::encode(value).map_err(|e| {
            warn!(key = %key, error = %e, "Failed to encode cache value");
            e
        })?;

        let path = self.resolver.entry_path(&key);
        // Verify before and after creating directories so a symlinked parent
        // never gets new directories created through it.
        self.check_path(&key, &path)?;
        storage::ensure_parent(&path).map_err(|e| {
            self.stats.record_write_failure();
            error!(key = %key, error = %e, "Failed to create cache directory");
            e
        })?;
        self.check_path(&key, &path)?;

        if let Err(e) = storage::write_locked(&path, &bytes) {
            self.stats.record_write_failure();
            error!(key = %key, path = %path.display(), error = %e, "Failed to write cache entry");
            return Err(CacheError::io(path, e));
        }

        self.stats.record_set();
        debug!(key = %key, bytes = bytes.len(), "Stored cache entry");
        Ok(())
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// A failure to store the computed value is logged and the value is
    /// still returned.
    pub fn get_or_insert_with<T, F>(&self, key: &str, ttl: impl Into<Ttl>, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get(key, ttl) {
            return value;
        }
        let value = compute();
        if let Err(e) = self.set(key, &value) {
            warn!(key, error = %e, "Failed to store computed value");
        }
        value
    }

    /// Remove the entry for one key.
    ///
    /// Returns `true` if a file was removed.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        let key = self.sanitize(key, SanitizedKey::new)?;
        let path = self.resolver.entry_path(&key);
        self.check_path(&key, &path)?;

        let removed = storage::remove(&path).map_err(|e| CacheError::io(&path, e))?;
        if removed {
            self.stats.record_deletes(1);
        }
        Ok(removed)
    }

    /// Remove every entry whose key matches `pattern`.
    ///
    /// `*` matches within one `/`-separated segment. A pattern without
    /// wildcards removes exactly that key. Failures on single files are
    /// logged and skipped. Returns how many entries were removed.
    pub fn clear(&self, pattern: &str) -> CacheResult<usize> {
        let pattern = self.sanitize(pattern, SanitizedKey::pattern)?;

        let mut targets = Vec::new();
        if pattern.has_wildcard() {
            targets.extend(
                storage::walk_entries(self.resolver.root())?
                    .into_iter()
                    .filter(|path| {
                        self.resolver
                            .key_for(path)
                            .is_some_and(|key| pattern.matches(&key))
                    }),
            );
        }
        let literal = self.resolver.entry_path(&pattern);
        if !targets.contains(&literal) {
            targets.push(literal);
        }

        let removed = self.remove_all(&targets);
        debug!(pattern = %pattern, removed, "Cleared cache entries");
        Ok(removed)
    }

    /// Clear with the default pattern, which removes every top-level entry.
    pub fn clear_default(&self) -> CacheResult<usize> {
        self.clear(DEFAULT_PATTERN)
    }

    /// Remove every entry at every depth.
    pub fn clear_all(&self) -> CacheResult<usize> {
        let entries = storage::walk_entries(self.resolver.root())?;
        let removed = self.remove_all(&entries);
        debug!(removed, "Cleared all cache entries");
        Ok(removed)
    }

    /// Remove every entry older than `ttl`. Returns how many were removed.
    pub fn prune_expired(&self, ttl: impl Into<Ttl>) -> CacheResult<usize> {
        let ttl = ttl.into();
        if ttl == Ttl::Never {
            return Ok(0);
        }
        let expired: Vec<PathBuf> = storage::walk_entries(self.resolver.root())?
            .into_iter()
            .filter(|path| entry::is_expired(path.metadata(), ttl))
            .collect();
        let removed = self.remove_all(&expired);
        for _ in 0..removed {
            self.stats.record_expiration();
        }
        debug!(removed, "Pruned expired cache entries");
        Ok(removed)
    }

    /// Keys of every stored entry, sorted.
    pub fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(storage::walk_entries(self.resolver.root())?
            .iter()
            .filter_map(|path| self.resolver.key_for(path))
            .collect())
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> CacheResult<usize> {
        Ok(storage::walk_entries(self.resolver.root())?.len())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Get a reference to the internal statistics counter.
    pub fn stats_ref(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    // Private helper methods

    fn sanitize(
        &self,
        raw: &str,
        rule: fn(&str) -> CacheResult<SanitizedKey>,
    ) -> CacheResult<SanitizedKey> {
        rule(raw).map_err(|e| {
            self.stats.record_rejection();
            warn!(key = %raw.escape_debug(), "Rejected invalid cache key");
            e
        })
    }

    fn check_path(&self, key: &SanitizedKey, path: &Path) -> CacheResult<()> {
        self.resolver.verify(path).map_err(|e| {
            self.stats.record_rejection();
            warn!(key = %key, path = %path.display(), "Cache path escapes the root");
            e
        })
    }

    /// Sanitize and resolve a key for reading; any failure is a miss.
    fn resolve_for_read(&self, key: &str) -> Option<PathBuf> {
        let key = self.sanitize(key, SanitizedKey::new).ok()?;
        let path = self.resolver.entry_path(&key);
        if !path.exists() {
            return None;
        }
        self.check_path(&key, &path).ok()?;
        Some(path)
    }

    fn evict_corrupt(&self, key: &str, path: &Path) {
        if storage::remove_best_effort(path) {
            self.stats.record_corruption();
            self.stats.record_deletes(1);
            debug!(key, "Removed corrupt cache entry");
        }
    }

    fn remove_all(&self, paths: &[PathBuf]) -> usize {
        let mut removed = 0;
        for path in paths {
            if let Err(e) = self.resolver.verify(path) {
                warn!(path = %path.display(), error = %e, "Skipping entry outside the cache root");
                continue;
            }
            if path.is_dir() {
                continue;
            }
            if storage::remove_best_effort(path) {
                removed += 1;
            }
        }
        self.stats.record_deletes(removed as u64);
        removed
    }
}
