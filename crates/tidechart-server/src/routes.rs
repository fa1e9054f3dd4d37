//! API route definitions.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, tide};
use crate::state::AppState;

/// Create the proxy router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/tide", get(tide::get_tide))
        .route("/health", get(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
