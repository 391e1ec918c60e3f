//! Async wrapper for use inside a tokio runtime.
//!
//! File I/O is blocking, so every call is moved onto tokio's blocking pool.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task;

use crate::cache::{CacheStore, ReadOptions};
use crate::entry::Ttl;
use crate::error::{CacheError, CacheResult};
use crate::stats::StatsSnapshot;

/// A cloneable async handle to a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct AsyncCacheStore {
    inner: Arc<CacheStore>,
}

impl AsyncCacheStore {
    pub fn new(store: CacheStore) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// The wrapped blocking store.
    pub fn blocking(&self) -> &CacheStore {
        &self.inner
    }

    pub async fn get<T>(&self, key: &str, ttl: impl Into<Ttl>) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.get_with(key, ReadOptions::ttl(ttl)).await
    }

    pub async fn get_with<T>(&self, key: &str, options: ReadOptions) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let store = Arc::clone(&self.inner);
        let key = key.to_string();
        task::spawn_blocking(move || store.get_with(&key, options))
            .await
            .ok()
            .flatten()
    }

    /// Encodes on the calling task, writes on the blocking pool.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let payload = serde_json::to_value(value)?;
        let store = Arc::clone(&self.inner);
        let key = key.to_string();
        task::spawn_blocking(move || store.set(&key, &payload))
            .await
            .map_err(join_error)?
    }

    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let store = Arc::clone(&self.inner);
        let key = key.to_string();
        task::spawn_blocking(move || store.delete(&key))
            .await
            .map_err(join_error)?
    }

    pub async fn clear(&self, pattern: &str) -> CacheResult<usize> {
        let store = Arc::clone(&self.inner);
        let pattern = pattern.to_string();
        task::spawn_blocking(move || store.clear(&pattern))
            .await
            .map_err(join_error)?
    }

    pub async fn prune_expired(&self, ttl: impl Into<Ttl>) -> CacheResult<usize> {
        let store = Arc::clone(&self.inner);
        let ttl = ttl.into();
        task::spawn_blocking(move || store.prune_expired(ttl))
            .await
            .map_err(join_error)?
    }

    pub fn set_bypass(&self, enabled: bool) {
        self.inner.set_bypass(enabled);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats()
    }
}

impl From<CacheStore> for AsyncCacheStore {
    fn from(store: CacheStore) -> Self {
        Self::new(store)
    }
}

fn join_error(err: task::JoinError) -> CacheError {
    CacheError::io(
        "<blocking task>",
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
    )
}
