//! Tide proxy server binary.

use anyhow::Result;
use std::sync::Arc;
use tidechart_cache::{FileStore, TtlCache};
use tidechart_core::Config;
use tidechart_server::{create_router, AppState};
use tidechart_weather::TideProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the subscriber so RUST_LOG from the file applies. A
    // missing file is fine; the process environment is used as-is.
    let _ = dotenvy::dotenv();

    tidechart_core::init()?;

    let config = Config::from_env()?;

    let store = FileStore::with_window(&config.cache_dir, config.cache_ttl)?;
    let cache = TtlCache::with_default_ttl(store, config.cache_ttl);
    cache.sweep_expired();

    let provider = TideProvider::new(config.api_key.clone(), config.api_host.clone(), cache)?;
    let state = Arc::new(AppState::new(provider));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("tide proxy listening on {}", listener.local_addr()?);
    tracing::info!("QWeather API host: {}", config.api_host);
    if let Some(public_url) = &config.public_url {
        tracing::info!("advertised at {public_url}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server closed");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives; in-flight requests then drain
/// before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install SIGTERM handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, closing server");
}
