//! The TTL cache proper: expiry invariant, lazy deletion, startup sweep.

use serde_json::Value;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::DEFAULT_TTL;

/// A stored payload together with the instant it stops being servable.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub payload: Value,
    pub expires_at: SystemTime,
}

/// Raw storage contract a cache backend provides.
///
/// Backends only move bytes and report freshness metadata; the expiry
/// decision itself belongs to [`TtlCache`]. A backend must never touch
/// anything outside its own directory or key namespace.
pub trait CacheStore: Send + Sync {
    /// Read the entry stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the entry exists but cannot be read or
    /// parsed.
    fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError>;

    /// Overwrite the entry under `key` with `payload`, fresh for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the entry cannot be persisted.
    fn persist(&self, key: &str, payload: &Value, ttl: Duration) -> Result<(), CacheError>;

    /// Delete the entry under `key`. Deleting an absent entry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when an existing entry cannot be deleted.
    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Every key currently stored in this backend's namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the namespace cannot be enumerated.
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

impl<S: CacheStore + ?Sized> CacheStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        (**self).load(key)
    }

    fn persist(&self, key: &str, payload: &Value, ttl: Duration) -> Result<(), CacheError> {
        (**self).persist(key, payload, ttl)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        (**self).keys()
    }
}

/// TTL cache over a pluggable storage backend.
///
/// An entry is servable iff `now - stored_at <= ttl`; the boundary instant
/// itself is still fresh. Expired entries are deleted lazily on read or by
/// [`TtlCache::sweep_expired`]. Storage failures are logged and degrade to a
/// miss (reads) or a no-op (writes); they never propagate, so cache
/// unavailability cannot block the data path.
///
/// There is no cross-process locking: concurrent writes to the same key race
/// at the storage layer and the last writer wins.
pub struct TtlCache<S> {
    store: S,
    default_ttl: Duration,
}

impl<S: CacheStore> TtlCache<S> {
    /// Wrap `store` with the standard 24-hour freshness window.
    pub fn new(store: S) -> Self {
        Self::with_default_ttl(store, DEFAULT_TTL)
    }

    /// Wrap `store` with a custom default freshness window.
    pub fn with_default_ttl(store: S, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Fetch the payload stored under `key`, if present and fresh.
    ///
    /// An expired or unreadable entry is deleted as a side effect and
    /// reported as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.store.load(key) {
            Ok(None) => None,
            Ok(Some(entry)) => {
                if is_expired(entry.expires_at) {
                    debug!("cache expired and deleted: {key}");
                    self.discard(key);
                    None
                } else {
                    debug!("cache hit for key: {key}");
                    Some(entry.payload)
                }
            }
            Err(error) => {
                warn!("failed to read cache entry {key}: {error}");
                self.discard(key);
                None
            }
        }
    }

    /// Store `payload` under `key` with the default freshness window.
    pub fn set(&self, key: &str, payload: &Value) {
        self.set_with_ttl(key, payload, self.default_ttl);
    }

    /// Store `payload` under `key`, fresh for `ttl`.
    ///
    /// Overwrites any prior entry wholesale. Write failures are logged and
    /// swallowed.
    pub fn set_with_ttl(&self, key: &str, payload: &Value, ttl: Duration) {
        match self.store.persist(key, payload, ttl) {
            Ok(()) => {
                let expires_at = SystemTime::now() + ttl;
                debug!(
                    "cached data for key: {key}, expires at {}",
                    chrono::DateTime::<chrono::Utc>::from(expires_at).to_rfc3339()
                );
            }
            Err(error) => warn!("failed to write cache entry {key}: {error}"),
        }
    }

    /// Delete every entry that is expired or unreadable, returning how many
    /// were removed. Idempotent; a scan failure is logged and treated as an
    /// empty namespace.
    pub fn sweep_expired(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(error) => {
                warn!("failed to scan cache for expired entries: {error}");
                return 0;
            }
        };

        let mut cleared = 0;
        for key in keys {
            let stale = match self.store.load(&key) {
                Ok(Some(entry)) => is_expired(entry.expires_at),
                Ok(None) => false,
                Err(_) => true,
            };
            if stale && self.discard(&key) {
                cleared += 1;
            }
        }

        if cleared > 0 {
            info!("cleared {cleared} expired cache entries");
        }
        cleared
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn discard(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => true,
            Err(error) => {
                warn!("failed to delete cache entry {key}: {error}");
                false
            }
        }
    }
}

fn is_expired(expires_at: SystemTime) -> bool {
    SystemTime::now() > expires_at
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::{FileStore, NamespaceStore};
    use serde_json::json;
    use std::path::Path;
    use std::thread::sleep;

    /// Both backends, wired to the same freshness window so the shared
    /// semantics can be asserted against each in turn.
    fn caches(dir: &Path, ttl: Duration) -> Vec<TtlCache<Box<dyn CacheStore>>> {
        let file: Box<dyn CacheStore> =
            Box::new(FileStore::with_window(dir.join("files"), ttl).unwrap());
        let kv: Box<dyn CacheStore> =
            Box::new(NamespaceStore::open(dir.join("kv.json"), "tide_chart_").unwrap());
        vec![
            TtlCache::with_default_ttl(file, ttl),
            TtlCache::with_default_ttl(kv, ttl),
        ]
    }

    #[test]
    fn round_trip_returns_deep_equal_payload() {
        let dir = tempfile::tempdir().unwrap();
        for cache in caches(dir.path(), DEFAULT_TTL) {
            let payload = json!({
                "code": "200",
                "tideHourly": [{"fxTime": "2024-06-15T00:00+08:00", "height": "1.2"}],
            });
            cache.set("ABC123_20240615", &payload);
            assert_eq!(cache.get("ABC123_20240615"), Some(payload));
        }
    }

    #[test]
    fn missing_key_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        for cache in caches(dir.path(), DEFAULT_TTL) {
            assert_eq!(cache.get("nothing_here"), None);
        }
    }

    #[test]
    fn overwrite_replaces_entry_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        for cache in caches(dir.path(), DEFAULT_TTL) {
            cache.set("k_1", &json!({"v": 1}));
            cache.set("k_1", &json!({"v": 2}));
            assert_eq!(cache.get("k_1"), Some(json!({"v": 2})));
        }
    }

    #[test]
    fn entry_expires_after_ttl() {
        let dir = tempfile::tempdir().unwrap();
        for cache in caches(dir.path(), Duration::from_millis(100)) {
            cache.set("k_1", &json!({"v": 1}));
            assert!(cache.get("k_1").is_some());
            sleep(Duration::from_millis(300));
            assert_eq!(cache.get("k_1"), None);
        }
    }

    #[test]
    fn expired_read_leaves_nothing_for_the_sweep() {
        let dir = tempfile::tempdir().unwrap();
        for cache in caches(dir.path(), Duration::from_millis(100)) {
            cache.set("k_1", &json!({"v": 1}));
            sleep(Duration::from_millis(300));
            assert_eq!(cache.get("k_1"), None);
            assert_eq!(cache.sweep_expired(), 0);
        }
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        for cache in caches(dir.path(), Duration::from_millis(200)) {
            cache.set("old_1", &json!({"v": 1}));
            cache.set("old_2", &json!({"v": 2}));
            sleep(Duration::from_millis(400));
            cache.set_with_ttl("fresh_1", &json!({"v": 3}), Duration::from_secs(60));

            // The file tier cannot carry a per-entry window, so only assert
            // the entries written before the sleep are gone.
            assert_eq!(cache.sweep_expired(), 2);
            assert!(cache.get("fresh_1").is_some());
        }
    }

    #[test]
    fn sweep_with_nothing_expired_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        for cache in caches(dir.path(), DEFAULT_TTL) {
            cache.set("k_1", &json!({"v": 1}));
            assert_eq!(cache.sweep_expired(), 0);
            assert_eq!(cache.sweep_expired(), 0);
            assert!(cache.get("k_1").is_some());
        }
    }

    #[test]
    fn per_entry_ttl_wins_on_the_namespace_tier() {
        let dir = tempfile::tempdir().unwrap();
        let store = NamespaceStore::open(dir.path().join("kv.json"), "tide_chart_").unwrap();
        let cache = TtlCache::new(store);

        cache.set_with_ttl("short_1", &json!({"v": 1}), Duration::from_millis(100));
        cache.set("long_1", &json!({"v": 2}));
        sleep(Duration::from_millis(300));

        assert_eq!(cache.get("short_1"), None);
        assert!(cache.get("long_1").is_some());
    }
}
