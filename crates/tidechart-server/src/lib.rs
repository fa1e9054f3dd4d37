//! HTTP proxy for the tide pipeline.
//!
//! Keeps the QWeather API key on the server side and exposes a single
//! forecast endpoint to the browser tier.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
