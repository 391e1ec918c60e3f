//! # Simple File Cache
//!
//! A filesystem-backed key-value cache for memoizing expensive values inside
//! an application, without an external cache server.
//!
//! ## Features
//!
//! - **One file per key**: `user/42` lives at `<root>/user/42.txt`
//! - **TTL on read**: freshness is judged from the file's modification time
//! - **Pattern invalidation**: `clear("user/*")` drops a whole key namespace
//! - **Self-healing**: expired and corrupt entries are deleted when found
//! - **Safe paths**: keys are sanitized and every path is checked against the root
//! - **Locked writes**: writers hold an exclusive advisory lock on the entry
//!
//! ## Quick Start
//!
//! ```rust
//! use simple_file_cache::{CacheConfig, CacheStore, Ttl};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = CacheStore::new(CacheConfig::new().root(dir.path())).unwrap();
//!
//! cache.set("user/1", &vec!["alice", "admin"]).unwrap();
//! cache.set("user/2", &false).unwrap();
//!
//! let roles: Option<Vec<String>> = cache.get("user/1", Ttl::minutes(10.0));
//! assert_eq!(roles.unwrap(), vec!["alice", "admin"]);
//! assert_eq!(cache.get::<bool>("user/2", Ttl::Never), Some(false));
//!
//! // Invalidate every user entry
//! cache.clear("user/*").unwrap();
//! assert!(cache.get::<bool>("user/2", Ttl::Never).is_none());
//! ```
//!
//! ## Consistency
//!
//! The cache is advisory. Reads never lock and may miss while another
//! process is writing the same key; a miss is always a correct answer.
//! Several processes may share one root.

pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod nonblocking;
pub mod stats;
pub mod value;

pub use cache::{CacheStore, ReadOptions, DEFAULT_PATTERN};
pub use config::CacheConfig;
pub use entry::Ttl;
pub use error::{CacheError, CacheResult};
pub use key::SanitizedKey;
pub use nonblocking::AsyncCacheStore;
pub use stats::{CacheStats, StatsSnapshot};
pub use value::Value;

// Internal modules - not part of public API
pub(crate) mod path;
pub(crate) mod storage;

pub use path::ENTRY_EXTENSION;
