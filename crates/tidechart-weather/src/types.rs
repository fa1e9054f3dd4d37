use serde::{Deserialize, Serialize};

/// Success status code shared by both QWeather endpoints.
pub(crate) const SUCCESS_CODE: &str = "200";

/// POI category for tide-monitoring stations.
pub(crate) const POI_TYPE_TIDE_STATION: &str = "TSTA";

/// Geographic coordinate, longitude first as the upstream API expects.
///
/// Values are passed through unchecked; out-of-range coordinates are the
/// upstream's to reject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

/// A tide-monitoring station resolved from a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
}

/// Body of a `/geo/v2/poi/lookup` response.
#[derive(Debug, Deserialize)]
pub(crate) struct PoiLookupResponse {
    pub code: String,
    #[serde(default)]
    pub poi: Vec<Poi>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Poi {
    pub id: String,
    pub name: String,
}

/// Tide pipeline errors.
///
/// Callers can tell the three classes apart; cache malfunctions never show
/// up here, the cache swallows them.
#[derive(Debug, thiserror::Error)]
pub enum TideError {
    #[error("No tide station found near this location")]
    NoStationFound,

    #[error("Failed to fetch tide data. Code: {code}")]
    UpstreamStatus { code: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl TideError {
    /// User-facing message for the UI boundary. Every failure class renders
    /// the same retry notice.
    pub fn user_message(&self) -> &'static str {
        "Failed to fetch tide data. Please try again."
    }
}
