//! Application state shared across handlers.

use tidechart_cache::FileStore;
use tidechart_weather::TideProvider;

/// State shared across all handlers: the provider owns the HTTP client, the
/// upstream credentials, and the file-backed forecast cache.
pub struct AppState {
    pub provider: TideProvider<FileStore>,
}

impl AppState {
    pub fn new(provider: TideProvider<FileStore>) -> Self {
        Self { provider }
    }
}
