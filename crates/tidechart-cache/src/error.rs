//! Cache-specific error types.
//!
//! These never cross the cache boundary: [`crate::TtlCache`] logs them and
//! degrades to a miss or a no-op write.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Corrupt(e.to_string())
    }
}
