//! Filesystem backend: one `<key>.json` file per entry.
//!
//! The file content is the raw JSON payload and freshness is derived from
//! the file's modification time, so a per-entry TTL is not representable
//! here: the store's configured window applies to every entry. The
//! namespace tier ([`crate::NamespaceStore`]) is the one that records an
//! explicit per-entry expiry.

use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{CacheStore, StoredEntry};
use crate::error::CacheError;
use crate::DEFAULT_TTL;

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    window: Duration,
}

impl FileStore {
    /// Open a store rooted at `dir` with the standard 24-hour window,
    /// creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Self::with_window(dir, DEFAULT_TTL)
    }

    /// Open a store rooted at `dir` with a custom freshness window.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the directory cannot be created.
    pub fn with_window(dir: impl Into<PathBuf>, window: Duration) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, window })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        let path = self.entry_path(key);

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let modified = metadata.modified()?;
        let raw = std::fs::read_to_string(&path)?;
        let payload: Value = serde_json::from_str(&raw)?;

        Ok(Some(StoredEntry {
            payload,
            expires_at: modified + self.window,
        }))
    }

    fn persist(&self, key: &str, payload: &Value, _ttl: Duration) -> Result<(), CacheError> {
        let raw = serde_json::to_string_pretty(payload)?;
        std::fs::write(self.entry_path(key), raw)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        Ok(keys)
    }
}
