//! Cache-backed tide forecast fetching.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tidechart_cache::{CacheStore, TtlCache};
use tracing::{debug, instrument};

use crate::station;
use crate::types::{Coordinate, Station, TideError, SUCCESS_CODE};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the QWeather tide pipeline.
///
/// Owns the HTTP client, the upstream credentials, and the TTL cache that
/// fronts the tide lookup. Each [`TideProvider::get_tide_data`] call runs
/// its two upstream requests strictly in sequence; concurrent calls are
/// independent and share only the cache's backing store.
pub struct TideProvider<S> {
    client: Client,
    api_key: String,
    base_url: String,
    cache: TtlCache<S>,
}

impl<S: CacheStore> TideProvider<S> {
    /// Build a provider against `base_url`, with `cache` in front of the
    /// tide lookup.
    ///
    /// # Errors
    ///
    /// Returns [`TideError::Network`] when the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        cache: TtlCache<S>,
    ) -> Result<Self, TideError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// Resolve the nearest station to the coordinate, then fetch its
    /// forecast for `date`.
    ///
    /// # Errors
    ///
    /// Propagates either stage's error unmodified, so callers can tell
    /// [`TideError::NoStationFound`], [`TideError::UpstreamStatus`] and
    /// [`TideError::Network`] apart.
    #[instrument(skip(self), level = "info")]
    pub async fn get_tide_data(
        &self,
        longitude: f64,
        latitude: f64,
        date: &str,
    ) -> Result<Value, TideError> {
        let coordinate = Coordinate {
            longitude,
            latitude,
        };
        let station =
            station::resolve_station(&self.client, &self.base_url, &self.api_key, &coordinate)
                .await?;
        self.fetch_tide(&station, date).await
    }

    /// Fetch the forecast for a station+date pair, cache first.
    ///
    /// `date` is an 8-digit `YYYYMMDD` string, passed through unvalidated; a
    /// malformed value comes back as an upstream error. On a cache hit the
    /// upstream is never contacted. A successful response is cached verbatim
    /// under `<station id>_<date>` before being returned; a non-success
    /// response is not cached.
    ///
    /// # Errors
    ///
    /// Returns [`TideError::UpstreamStatus`] carrying the upstream code, or
    /// [`TideError::Network`] on transport failure. No retry at this layer.
    #[instrument(skip(self, station), fields(station = %station.id), level = "debug")]
    pub async fn fetch_tide(&self, station: &Station, date: &str) -> Result<Value, TideError> {
        let cache_key = format!("{}_{}", station.id, date);

        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("serving tide data from cache: {cache_key}");
            return Ok(cached);
        }

        let url = format!("{}/v7/ocean/tide", self.base_url);
        debug!("requesting tide data: {url}?location={}&date={date}", station.id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("location", station.id.as_str()),
                ("date", date),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let payload: Value = response.json().await?;

        let code = payload.get("code").and_then(Value::as_str).unwrap_or_default();
        if code != SUCCESS_CODE {
            return Err(TideError::UpstreamStatus {
                code: code.to_string(),
            });
        }

        self.cache.set(&cache_key, &payload);
        Ok(payload)
    }

    /// The cache fronting the tide lookup.
    pub fn cache(&self) -> &TtlCache<S> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use serde_json::json;
    use tidechart_cache::FileStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file_cache(dir: &std::path::Path) -> TtlCache<FileStore> {
        TtlCache::new(FileStore::new(dir).unwrap())
    }

    fn station_one() -> Station {
        Station {
            id: "ABC123".to_string(),
            name: "Station One".to_string(),
        }
    }

    async fn mount_geocode(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/geo/v2/poi/lookup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "200",
                "poi": [{"id": "P1", "name": "Station One"}],
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/ocean/tide"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "200"})))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = file_cache(dir.path());
        let primed = json!({"code": "200", "tideHourly": [{"height": "1.2"}]});
        cache.set("ABC123_20240615", &primed);

        let provider = TideProvider::new("test-key", server.uri(), cache).unwrap();
        let payload = provider
            .fetch_tide(&station_one(), "20240615")
            .await
            .unwrap();

        assert_eq!(payload, primed);
    }

    #[tokio::test]
    async fn upstream_error_propagates_and_nothing_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/ocean/tide"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "400"})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            TideProvider::new("test-key", server.uri(), file_cache(dir.path())).unwrap();

        let result = provider.fetch_tide(&station_one(), "20240615").await;

        assert!(
            matches!(result, Err(TideError::UpstreamStatus { ref code }) if code == "400")
        );
        assert!(!dir.path().join("ABC123_20240615.json").exists());
    }

    #[tokio::test]
    async fn no_station_means_the_tide_endpoint_is_never_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/v2/poi/lookup"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": "200", "poi": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v7/ocean/tide"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "200"})))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            TideProvider::new("test-key", server.uri(), file_cache(dir.path())).unwrap();

        let result = provider.get_tide_data(121.47, 31.23, "20240615").await;
        assert!(matches!(result, Err(TideError::NoStationFound)));
    }

    #[tokio::test]
    async fn end_to_end_success_then_cache() {
        let server = MockServer::start().await;
        // The station is re-resolved on every call; only the tide lookup is
        // cached.
        mount_geocode(&server, 2).await;

        let tide_body = json!({
            "code": "200",
            "tideHourly": [{"fxTime": "2024-06-15T00:00+08:00", "height": "1.2"}],
        });
        Mock::given(method("GET"))
            .and(path("/v7/ocean/tide"))
            .and(query_param("location", "P1"))
            .and(query_param("date", "20240615"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tide_body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            TideProvider::new("test-key", server.uri(), file_cache(dir.path())).unwrap();

        let first = provider.get_tide_data(121.47, 31.23, "20240615").await.unwrap();
        assert_eq!(first, tide_body);

        let second = provider.get_tide_data(121.47, 31.23, "20240615").await.unwrap();
        assert_eq!(second, tide_body);
    }

    #[tokio::test]
    async fn missing_code_field_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/ocean/tide"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let provider =
            TideProvider::new("test-key", server.uri(), file_cache(dir.path())).unwrap();

        let result = provider.fetch_tide(&station_one(), "20240615").await;
        assert!(matches!(result, Err(TideError::UpstreamStatus { .. })));
    }
}
