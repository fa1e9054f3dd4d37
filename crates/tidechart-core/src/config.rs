//! Environment-backed configuration for the proxy tier.
//!
//! The upstream API key and host are never hard-coded; every deployment
//! supplies them through the process environment (a `.env` file is loaded by
//! the server binary before this module runs).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default port the proxy listens on.
pub const DEFAULT_PORT: u16 = 3001;

const DEFAULT_CACHE_DIR: &str = "./cache";
const DEFAULT_TTL_HOURS: u64 = 24;

/// Configuration errors, reported at startup before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Runtime configuration for the tide proxy.
#[derive(Debug, Clone)]
pub struct Config {
    /// QWeather API key, sent as the `key` query parameter upstream.
    pub api_key: String,
    /// Base URL of the dedicated QWeather API host.
    pub api_host: String,
    /// Port the proxy listens on.
    pub port: u16,
    /// Public-facing base URL of the proxy, when deployed behind one.
    pub public_url: Option<String>,
    /// Directory holding the file-backed forecast cache.
    pub cache_dir: PathBuf,
    /// Freshness window for cached forecasts.
    pub cache_ttl: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is absent or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = require(&lookup, "QWEATHER_API_KEY")?;
        let api_host = require(&lookup, "QWEATHER_API_HOST")?;
        validate_host(&api_host)?;

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                field: "PORT",
                message: format!("not a valid port number: {raw}"),
            })?,
            None => DEFAULT_PORT,
        };

        let public_url = lookup("TIDE_PUBLIC_URL").filter(|v| !v.trim().is_empty());

        let cache_dir = lookup("TIDE_CACHE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from);

        let ttl_hours = match lookup("TIDE_CACHE_TTL_HOURS") {
            Some(raw) => {
                let hours = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    field: "TIDE_CACHE_TTL_HOURS",
                    message: format!("not a valid hour count: {raw}"),
                })?;
                if hours == 0 {
                    return Err(ConfigError::Invalid {
                        field: "TIDE_CACHE_TTL_HOURS",
                        message: "must be greater than 0".to_string(),
                    });
                }
                hours
            }
            None => DEFAULT_TTL_HOURS,
        };

        Ok(Self {
            api_key,
            api_host: api_host.trim_end_matches('/').to_string(),
            port,
            public_url,
            cache_dir,
            cache_ttl: Duration::from_secs(ttl_hours * 60 * 60),
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingSetting(name))
}

fn validate_host(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        field: "QWEATHER_API_HOST",
        message: format!("invalid URL: {e}"),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid {
            field: "QWEATHER_API_HOST",
            message: format!("URL must use http or https scheme, got: {}", url.scheme()),
        });
    }

    if url.host().is_none() {
        return Err(ConfigError::Invalid {
            field: "QWEATHER_API_HOST",
            message: "URL must have a host".to_string(),
        });
    }

    Ok(())
}
