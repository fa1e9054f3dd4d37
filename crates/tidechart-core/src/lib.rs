//! Core configuration and process bootstrap for Tidechart.

pub mod config;

pub use config::{Config, ConfigError};

use anyhow::Result;

/// Initialize logging for a Tidechart process.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Tidechart core initialized");
    Ok(())
}
