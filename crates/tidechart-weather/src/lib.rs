//! Tide forecast pipeline against the QWeather API.
//!
//! Resolves a coordinate to its nearest tide-monitoring station, then
//! fetches the station's forecast for a date, with a TTL cache in front of
//! the tide lookup.

pub mod provider;
pub mod station;
pub mod types;

pub use provider::TideProvider;
pub use station::resolve_station;
pub use types::{Coordinate, Station, TideError};
