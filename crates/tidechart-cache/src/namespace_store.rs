//! Key-value backend mirroring the browser tier's persisted store.
//!
//! Entries live under a fixed key prefix inside a single JSON map file; each
//! entry's value is itself a JSON-encoded `{"data", "expiry"}` string with
//! the expiry as epoch milliseconds. Keys outside the prefix are preserved
//! untouched, so the file can be shared with other namespaces.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cache::{CacheStore, StoredEntry};
use crate::error::CacheError;

#[derive(Debug, Serialize, Deserialize)]
struct NamespaceEntry {
    data: Value,
    expiry: u64,
}

#[derive(Debug)]
pub struct NamespaceStore {
    path: PathBuf,
    prefix: String,
    entries: Mutex<BTreeMap<String, String>>,
}

impl NamespaceStore {
    /// Open (or create) the store file at `path`, scoped to `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when an existing store file cannot be read or
    /// parsed.
    pub fn open(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, CacheError> {
        let path = path.into();

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            prefix: prefix.into(),
            entries: Mutex::new(entries),
        })
    }

    /// Remove every entry in this namespace regardless of freshness,
    /// returning how many were removed. Failures are logged and swallowed.
    pub fn clear_all(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&self.prefix));
        let cleared = before - entries.len();

        if let Err(error) = self.flush(&entries) {
            tracing::warn!("failed to persist cleared cache namespace: {error}");
        } else if cleared > 0 {
            tracing::info!("cleared {cleared} cache entries");
        }
        cleared
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl CacheStore for NamespaceStore {
    fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        let entries = self.entries.lock();
        let Some(raw) = entries.get(&self.full_key(key)) else {
            return Ok(None);
        };

        let entry: NamespaceEntry = serde_json::from_str(raw)?;
        Ok(Some(StoredEntry {
            payload: entry.data,
            expires_at: UNIX_EPOCH + Duration::from_millis(entry.expiry),
        }))
    }

    fn persist(&self, key: &str, payload: &Value, ttl: Duration) -> Result<(), CacheError> {
        let expiry = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(ttl)
            .as_millis() as u64;

        let raw = serde_json::to_string(&NamespaceEntry {
            data: payload.clone(),
            expiry,
        })?;

        let mut entries = self.entries.lock();
        entries.insert(self.full_key(key), raw);
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        if entries.remove(&self.full_key(key)).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = self.entries.lock();
        Ok(entries
            .keys()
            .filter_map(|key| key.strip_prefix(&self.prefix))
            .map(str::to_string)
            .collect())
    }
}
