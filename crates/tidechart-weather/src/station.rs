//! Nearest-station resolution via the QWeather POI lookup.

use reqwest::Client;
use tracing::{debug, info};

use crate::types::{Coordinate, PoiLookupResponse, Station, TideError, POI_TYPE_TIDE_STATION, SUCCESS_CODE};

/// Find the tide station nearest to `coordinate`.
///
/// Issues a single POI lookup restricted to the tide-station category and
/// takes the first result in the upstream's returned order as nearest. The
/// upstream is trusted to sort by distance; no client-side recomputation is
/// done, so a change in its ordering would silently change which station is
/// picked.
///
/// # Errors
///
/// Returns [`TideError::NoStationFound`] when the lookup reports a
/// non-success code or an empty POI list, and [`TideError::Network`] on
/// transport failure. No retry at this layer.
pub async fn resolve_station(
    client: &Client,
    base_url: &str,
    api_key: &str,
    coordinate: &Coordinate,
) -> Result<Station, TideError> {
    let url = format!("{base_url}/geo/v2/poi/lookup");
    let location = format!("{},{}", coordinate.longitude, coordinate.latitude);
    debug!("requesting POI lookup: {url}?location={location}&type={POI_TYPE_TIDE_STATION}");

    let response = client
        .get(&url)
        .query(&[
            ("location", location.as_str()),
            ("type", POI_TYPE_TIDE_STATION),
            ("key", api_key),
        ])
        .send()
        .await?;

    let body: PoiLookupResponse = response.json().await?;

    if body.code != SUCCESS_CODE {
        debug!("POI lookup returned code {}", body.code);
        return Err(TideError::NoStationFound);
    }

    let Some(poi) = body.poi.into_iter().next() else {
        return Err(TideError::NoStationFound);
    };

    info!("found tide station: {} ({})", poi.name, poi.id);
    Ok(Station {
        id: poi.id,
        name: poi.name,
    })
}
