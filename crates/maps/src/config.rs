//! Maps client configuration

use std::time::Duration;

use crate::MapsError;

/// Environment variable holding the maps proxy base URL
pub const MAPS_PROXY_URL_ENV: &str = "TRIP_PLANNER_MAPS_PROXY_URL";

/// Configuration for the maps proxy client
#[derive(Debug, Clone)]
pub struct MapsConfig {
    /// Base URL of the proxy (e.g., "https://app.example.com/api/maps")
    pub proxy_base_url: String,

    /// HTTP timeout per request
    pub timeout: Duration,

    /// Region bias passed to geocoding (e.g., "fr")
    pub region: Option<String>,

    /// Response language (e.g., "en")
    pub language: Option<String>,

    pub geocode_ttl: Duration,
    pub places_ttl: Duration,
    pub details_ttl: Duration,
    pub directions_ttl: Duration,
    pub autocomplete_ttl: Duration,

    /// TTL for negative answers (ZERO_RESULTS and other non-OK statuses)
    pub negative_ttl: Duration,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: "http://localhost:3000/api/maps".to_string(),
            timeout: Duration::from_secs(15),
            region: None,
            language: None,
            geocode_ttl: Duration::from_secs(24 * 3600),
            places_ttl: Duration::from_secs(3600),
            details_ttl: Duration::from_secs(24 * 3600),
            directions_ttl: Duration::from_secs(3600),
            autocomplete_ttl: Duration::from_secs(600),
            negative_ttl: Duration::from_secs(300),
        }
    }
}

impl MapsConfig {
    /// Create a config pointing at the given proxy
    pub fn new(proxy_base_url: impl Into<String>) -> Self {
        Self {
            proxy_base_url: proxy_base_url.into(),
            ..Default::default()
        }
    }

    /// Read the proxy URL from `TRIP_PLANNER_MAPS_PROXY_URL`
    pub fn from_env() -> Result<Self, MapsError> {
        let url = std::env::var(MAPS_PROXY_URL_ENV)
            .map_err(|_| MapsError::Config(format!("{} is not set", MAPS_PROXY_URL_ENV)))?;
        Ok(Self::new(url))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }

    pub fn geocode_ttl(mut self, ttl: Duration) -> Self {
        self.geocode_ttl = ttl;
        self
    }
}
