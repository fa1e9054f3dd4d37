//! TTL cache for tide forecasts.
//!
//! One cache semantics, two storage backends: a directory of JSON files for
//! the server tier ([`FileStore`]) and a prefix-namespaced key-value file
//! mirroring the browser tier ([`NamespaceStore`]). Both are driven through
//! [`TtlCache`], which owns the expiry invariant and never lets a storage
//! failure escape into the caller's control flow.

pub mod cache;
pub mod error;
pub mod file_store;
pub mod namespace_store;

pub use cache::{CacheStore, StoredEntry, TtlCache};
pub use error::CacheError;
pub use file_store::FileStore;
pub use namespace_store::NamespaceStore;

use std::time::Duration;

/// Default freshness window for cached forecasts.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
