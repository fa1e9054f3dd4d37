//! Tide forecast proxy handler.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TideParams {
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `GET /api/tide?lng&lat&date`.
///
/// All three parameters are required; a missing one is rejected with 400
/// before any upstream call. On success the upstream forecast document is
/// passed through verbatim; any pipeline failure becomes a 500 with the
/// error message in the body.
pub async fn get_tide(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TideParams>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorBody>)> {
    let (Some(lng), Some(lat), Some(date)) = (params.lng, params.lat, params.date.as_deref())
    else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Missing required parameters: lng, lat, date".to_string(),
            }),
        ));
    };

    match state.provider.get_tide_data(lng, lat, date).await {
        Ok(payload) => Ok(Json(payload)),
        Err(error) => {
            error!("tide request failed: {error}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: error.to_string(),
                }),
            ))
        }
    }
}
