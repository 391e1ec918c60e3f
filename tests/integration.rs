//! Integration tests for the file cache.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use simple_file_cache::{CacheConfig, CacheError, CacheStore, Ttl, Value};
use tempfile::TempDir;

fn new_cache() -> (TempDir, CacheStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = CacheStore::open(dir.path().join("simple_cache_test")).expect("store");
    (dir, cache)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    property: String,
    tags: Vec<String>,
    admin: bool,
}

#[test]
fn test_round_trip_of_supported_types() {
    let (_dir, cache) = new_cache();

    let mut fruits = BTreeMap::new();
    fruits.insert("a".to_string(), "apple".to_string());
    fruits.insert("b".to_string(), "banana".to_string());
    let profile = Profile {
        property: "value".to_string(),
        tags: vec!["x".to_string()],
        admin: false,
    };

    cache.set("string", "Hello World").unwrap();
    cache.set("integer", &123).unwrap();
    cache.set("true", &true).unwrap();
    cache.set("false", &false).unwrap();
    cache.set("list", &vec![1, 2, 3]).unwrap();
    cache.set("map", &fruits).unwrap();
    cache.set("object", &profile).unwrap();
    cache.set("empty_list", &Vec::<i32>::new()).unwrap();
    cache.set("empty_map", &BTreeMap::<String, i32>::new()).unwrap();
    cache.set("empty_string", "").unwrap();

    assert_eq!(cache.get::<String>("string", Ttl::minutes(0.0)).as_deref(), Some("Hello World"));
    assert_eq!(cache.get::<i64>("integer", Ttl::Never), Some(123));
    assert_eq!(cache.get::<bool>("true", Ttl::Never), Some(true));
    assert_eq!(cache.get::<bool>("false", Ttl::Never), Some(false));
    assert_eq!(cache.get::<Vec<i32>>("list", Ttl::Never), Some(vec![1, 2, 3]));
    assert_eq!(cache.get::<BTreeMap<String, String>>("map", Ttl::Never), Some(fruits));
    assert_eq!(cache.get::<Profile>("object", Ttl::Never), Some(profile));
    assert_eq!(cache.get::<Vec<i32>>("empty_list", Ttl::Never), Some(vec![]));
    assert_eq!(
        cache.get::<BTreeMap<String, i32>>("empty_map", Ttl::Never),
        Some(BTreeMap::new())
    );
    assert_eq!(cache.get::<String>("empty_string", Ttl::Never).as_deref(), Some(""));
}

#[test]
fn test_untyped_values_round_trip() {
    let (_dir, cache) = new_cache();

    let record: Value = [
        ("name", Value::from("widget")),
        ("count", Value::from(3)),
        ("ratio", Value::from(0.25)),
        ("nested", Value::from(vec![Value::Null, Value::from(false)])),
    ]
    .into_iter()
    .collect();

    cache.set("record", &record).unwrap();
    assert_eq!(cache.get::<Value>("record", Ttl::Never), Some(record));
}

#[test]
fn test_expiration_deletes_entry() {
    let (_dir, cache) = new_cache();

    cache.set("expireKey", "expireValue").unwrap();
    let path = cache.root().join("expireKey.txt");
    assert!(path.is_file());

    thread::sleep(Duration::from_millis(2100));

    assert!(cache.get::<String>("expireKey", Ttl::minutes(1.0 / 60.0)).is_none());
    assert!(!path.exists());
    assert_eq!(cache.stats().expirations, 1);
}

#[test]
fn test_non_expiration() {
    let (_dir, cache) = new_cache();

    cache.set("fresh", "value").unwrap();
    assert_eq!(
        cache.get::<String>("fresh", Ttl::minutes(60.0)).as_deref(),
        Some("value")
    );
}

#[test]
fn test_cache_miss_returns_none() {
    let (_dir, cache) = new_cache();
    assert!(cache.get::<String>("nonExistentKey", Ttl::Never).is_none());
}

#[test]
fn test_bypass() {
    let (_dir, cache) = new_cache();

    cache.set("key", "value").unwrap();
    cache.set_bypass(true);
    assert!(cache.get::<String>("key", Ttl::Never).is_none());
    assert!(!cache.contains("key", Ttl::Never));

    cache.set_bypass(false);
    assert_eq!(cache.get::<String>("key", Ttl::Never).as_deref(), Some("value"));
}

#[test]
fn test_targeted_clear() {
    let (_dir, cache) = new_cache();

    cache.set("user/1", "a").unwrap();
    cache.set("user/2", "b").unwrap();
    cache.set("other/1", "c").unwrap();

    assert_eq!(cache.clear("user/*").unwrap(), 2);

    assert!(cache.get::<String>("user/1", Ttl::Never).is_none());
    assert!(cache.get::<String>("user/2", Ttl::Never).is_none());
    assert_eq!(cache.get::<String>("other/1", Ttl::Never).as_deref(), Some("c"));
}

#[test]
fn test_clear_literal_key() {
    let (_dir, cache) = new_cache();

    cache.set("clearKey", "clearValue").unwrap();
    cache.set("clearKeyTwin", "other").unwrap();

    assert_eq!(cache.clear("clearKey").unwrap(), 1);
    assert!(cache.get::<String>("clearKey", Ttl::Never).is_none());
    assert!(cache.contains("clearKeyTwin", Ttl::Never));
}

#[test]
fn test_corruption_self_heals() {
    let (_dir, cache) = new_cache();

    cache.set("victim", "original").unwrap();
    let path = cache.root().join("victim.txt");
    fs::write(&path, b"\x00\x01garbage{{{").unwrap();

    assert!(cache.get::<String>("victim", Ttl::Never).is_none());
    assert!(!path.exists());
    assert_eq!(cache.stats().corruptions, 1);

    cache.set("victim", "restored").unwrap();
    assert_eq!(cache.get::<String>("victim", Ttl::Never).as_deref(), Some("restored"));
}

#[test]
fn test_empty_file_is_a_miss() {
    let (_dir, cache) = new_cache();

    let path = cache.root().join("empty.txt");
    fs::write(&path, b"").unwrap();

    assert!(cache.get::<String>("empty", Ttl::Never).is_none());
    assert!(!path.exists());
}

#[test]
fn test_path_traversal_stays_inside_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    let cache = CacheStore::open(&root).unwrap();

    let outside = dir.path().join("passwd.txt");
    fs::write(&outside, "do not touch").unwrap();

    cache.set("../passwd", "overwritten").unwrap();
    assert_eq!(fs::read_to_string(&outside).unwrap(), "do not touch");
    assert!(root.join("passwd.txt").is_file());

    assert!(cache.get::<String>("../../etc/passwd", Ttl::Never).is_none());
    assert!(matches!(cache.set("\0", &1), Err(CacheError::InvalidKey(_))));

    cache.set("nul\0key", &1).unwrap();
    assert!(root.join("nulkey.txt").is_file());

    cache.clear("../*").unwrap();
    assert!(outside.exists());
}

#[cfg(unix)]
#[test]
fn test_symlinked_subdirectory_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    let cache = CacheStore::open(&root).unwrap();

    let outside = dir.path().join("outside");
    fs::create_dir(&outside).unwrap();
    fs::write(outside.join("secret.txt"), "{\"v\":1,\"data\":\"secret\"}").unwrap();
    std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

    assert!(cache.get::<String>("link/secret", Ttl::Never).is_none());
    assert!(matches!(
        cache.set("link/new", &1),
        Err(CacheError::UnauthorizedPath(_))
    ));
    assert!(matches!(
        cache.set("link/deeper/new", &1),
        Err(CacheError::UnauthorizedPath(_))
    ));
    assert!(!outside.join("deeper").exists());

    cache.clear("link/*").unwrap();
    assert!(outside.join("secret.txt").exists());
}

#[test]
fn test_idempotent_clear() {
    let (_dir, cache) = new_cache();

    cache.set("keep", &1).unwrap();

    assert_eq!(cache.clear("never-set").unwrap(), 0);
    assert_eq!(cache.clear("never-set").unwrap(), 0);
    assert_eq!(cache.clear("missing/*").unwrap(), 0);

    assert_eq!(cache.keys().unwrap(), vec!["keep".to_string()]);
}

#[test]
fn test_cache_directory_creation() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nonExistentDir").join("child");

    let _cache = CacheStore::open(&nested).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn test_invalid_cache_root() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    fs::write(&file, "x").unwrap();

    let result = CacheStore::open(file.join("cache"));
    assert!(matches!(result, Err(CacheError::Configuration { .. })));
}

#[test]
fn test_persistence_after_reinstantiation() {
    let dir = tempfile::tempdir().unwrap();

    let first = CacheStore::open(dir.path()).unwrap();
    first.set("persistentKey", "persistentValue").unwrap();
    drop(first);

    let second = CacheStore::new(CacheConfig::new().root(dir.path())).unwrap();
    assert_eq!(
        second.get::<String>("persistentKey", Ttl::Never).as_deref(),
        Some("persistentValue")
    );
}

#[test]
fn test_prune_expired() {
    let (_dir, cache) = new_cache();

    cache.set("old/a", &1).unwrap();
    cache.set("old/b", &2).unwrap();
    thread::sleep(Duration::from_millis(2100));
    cache.set("new", &3).unwrap();

    assert_eq!(cache.prune_expired(Ttl::seconds(1)).unwrap(), 2);
    assert_eq!(cache.keys().unwrap(), vec!["new".to_string()]);
    assert_eq!(cache.prune_expired(Ttl::Never).unwrap(), 0);
}

#[test]
fn test_concurrent_writers_never_expose_partial_values() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheStore::open(dir.path()).unwrap());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..50 {
                    let value = vec![format!("writer_{}_{}", t, i); 64];
                    cache.set("shared", &value).unwrap();
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().expect("Thread panicked");
    }

    // The last complete write wins; all 64 elements come from one writer.
    let value: Vec<String> = cache.get("shared", Ttl::Never).expect("value present");
    assert_eq!(value.len(), 64);
    assert!(value.iter().all(|v| v == &value[0]));
}

#[test]
fn test_array_shaped_entry_is_evicted() {
    let (_dir, cache) = new_cache();

    let path = cache.root().join("g.txt");
    fs::write(&path, br#"[1,"surprise"]"#).unwrap();

    assert!(cache.get::<String>("g", Ttl::Never).is_none());
    assert!(!path.exists());
    assert_eq!(cache.stats().corruptions, 1);
}

#[test]
fn test_non_finite_float_is_rejected_before_writing() {
    let (_dir, cache) = new_cache();

    assert!(matches!(
        cache.set("nan", &f64::NAN),
        Err(CacheError::Serialization(_))
    ));
    assert!(!cache.root().join("nan.txt").exists());

    cache.set("ratio", &0.5).unwrap();
    assert!(matches!(
        cache.set("ratio", &vec![1.0, f64::INFINITY]),
        Err(CacheError::Serialization(_))
    ));
    assert_eq!(cache.get::<f64>("ratio", Ttl::Never), Some(0.5));
}

#[test]
fn test_large_unsigned_round_trips_untyped() {
    let (_dir, cache) = new_cache();

    cache.set("big", &u64::MAX).unwrap();
    assert_eq!(cache.get::<Value>("big", Ttl::Never), Some(Value::UInt(u64::MAX)));
    assert_eq!(cache.get::<u64>("big", Ttl::Never), Some(u64::MAX));
}

#[test]
fn test_parent_that_is_a_file_reports_directory_error() {
    let (_dir, cache) = new_cache();

    fs::write(cache.root().join("x"), "plain file").unwrap();

    assert!(matches!(
        cache.set("x/y", &1),
        Err(CacheError::Directory { .. })
    ));
    assert!(cache.get::<i32>("x/y", Ttl::Never).is_none());
    assert_eq!(cache.stats().write_failures, 1);

    cache.set("z", &2).unwrap();
    assert_eq!(cache.get::<i32>("z", Ttl::Never), Some(2));
}

#[cfg(unix)]
#[test]
fn test_entry_that_is_a_directory_reports_io_error() {
    let (_dir, cache) = new_cache();

    let blocker = cache.root().join("k.txt");
    fs::create_dir(&blocker).unwrap();

    assert!(matches!(cache.set("k", &1), Err(CacheError::Io { .. })));
    assert!(cache.get::<i32>("k", Ttl::Never).is_none());
    assert!(!cache.contains("k", Ttl::Never));

    // The directory cannot be unlinked, so nothing counts as evicted.
    assert!(blocker.is_dir());
    let stats = cache.stats();
    assert_eq!(stats.corruptions, 0);
    assert_eq!(stats.write_failures, 1);

    cache.set("other", &3).unwrap();
    assert_eq!(cache.get::<i32>("other", Ttl::Never), Some(3));
}
