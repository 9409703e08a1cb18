//! Cached, usage-tracked maps client
//!
//! Every lookup goes through the tiered cache first. On a miss the client
//! checks quotas, counts the attempt, calls the proxy and caches the answer
//! with the TTL for that endpoint. Non-OK statuses, and OK responses with
//! nothing in them, are cached as "no data" for `negative_ttl`. Transport,
//! parse and cancellation failures are logged and return "no data" without
//! touching the cache.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trip_planner_cache::{cache_key, TieredCache};
use trip_planner_core::GeoPoint;
use trip_planner_usage::{UsageKind, UsageTracker};

use crate::models::{
    parse_details, parse_directions, parse_geocode, parse_places, parse_predictions,
};
use crate::{
    response_status, DirectionsSummary, GeocodeResult, HttpTransport, MapsConfig, MapsError,
    MapsTransport, PlaceDetails, PlaceSummary, Prediction, QueryParams, TravelMode,
};

type Parser<T> = fn(Value) -> Result<T, MapsError>;

/// Client for the maps proxy. Cheap to clone; clones share cache, usage
/// tracker and transport.
#[derive(Clone)]
pub struct MapsClient {
    config: MapsConfig,
    transport: Arc<dyn MapsTransport>,
    cache: Arc<TieredCache>,
    usage: Arc<UsageTracker>,
    cancel: CancellationToken,
}

impl MapsClient {
    pub fn new(
        config: MapsConfig,
        transport: Arc<dyn MapsTransport>,
        cache: Arc<TieredCache>,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
            usage,
            cancel: CancellationToken::new(),
        }
    }

    /// Client talking to `config.proxy_base_url` over HTTP
    pub fn with_http(
        config: MapsConfig,
        cache: Arc<TieredCache>,
        usage: Arc<UsageTracker>,
    ) -> Result<Self, MapsError> {
        let transport = HttpTransport::new(&config)?;
        tracing::info!(proxy = %config.proxy_base_url, "Maps client created");
        Ok(Self::new(config, Arc::new(transport), cache, usage))
    }

    /// Clone of this client whose requests stop when `token` is cancelled.
    ///
    /// A cancelled request returns "no data" and writes nothing to the cache.
    /// Requests already sent are still counted as usage.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn config(&self) -> &MapsConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Geocode a free-form address
    pub async fn geocode(&self, address: &str) -> Option<GeocodeResult> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }

        let mut params = self.base_params();
        params.insert("address", address.to_string());
        self.lookup(
            UsageKind::Geocode,
            "geocode",
            params,
            self.config.geocode_ttl,
            parse_geocode,
        )
        .await
    }

    /// Text search for places, optionally biased towards a location
    pub async fn search_places(&self, query: &str, near: Option<&GeoPoint>) -> Vec<PlaceSummary> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let mut params = self.base_params();
        params.insert("query", query.to_string());
        if let Some(point) = near {
            params.insert("location", lat_lng(point));
        }
        self.lookup(
            UsageKind::PlaceSearch,
            "places/search",
            params,
            self.config.places_ttl,
            parse_places,
        )
        .await
    }

    pub async fn place_details(&self, place_id: &str) -> Option<PlaceDetails> {
        if place_id.is_empty() {
            return None;
        }

        let mut params = self.base_params();
        params.insert("place_id", place_id.to_string());
        self.lookup(
            UsageKind::PlaceDetails,
            "places/details",
            params,
            self.config.details_ttl,
            parse_details,
        )
        .await
    }

    /// Directions between two addresses or "lat,lng" strings
    pub async fn directions(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Option<DirectionsSummary> {
        let mut params = self.base_params();
        params.insert("origin", origin.to_string());
        params.insert("destination", destination.to_string());
        params.insert("mode", mode.as_str().to_string());
        self.lookup(
            UsageKind::Directions,
            "directions",
            params,
            self.config.directions_ttl,
            parse_directions,
        )
        .await
    }

    pub async fn directions_between(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        mode: TravelMode,
    ) -> Option<DirectionsSummary> {
        self.directions(&lat_lng(origin), &lat_lng(destination), mode).await
    }

    /// Address completions for partial input
    pub async fn autocomplete(&self, input: &str) -> Vec<Prediction> {
        if input.trim().is_empty() {
            return Vec::new();
        }

        let mut params = self.base_params();
        params.insert("input", input.to_string());
        self.lookup(
            UsageKind::Autocomplete,
            "autocomplete",
            params,
            self.config.autocomplete_ttl,
            parse_predictions,
        )
        .await
    }

    fn base_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(region) = &self.config.region {
            params.insert("region", region.clone());
        }
        if let Some(language) = &self.config.language {
            params.insert("language", language.clone());
        }
        params
    }

    /// Cache-first lookup. `T::default()` is the "no data" answer.
    async fn lookup<T>(
        &self,
        kind: UsageKind,
        endpoint: &'static str,
        params: QueryParams,
        ttl: Duration,
        parse: Parser<T>,
    ) -> T
    where
        T: Default + Serialize + DeserializeOwned,
    {
        let key = match cache_key(kind.as_str(), &params) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Could not build cache key");
                return T::default();
            }
        };

        let params = &params;
        let fetched = self
            .cache
            .get_or_fetch(&key, move || async move {
                match self.fetch(kind, endpoint, params, parse).await {
                    Ok(value) => Some((value, ttl)),
                    Err(e) if e.is_negative_result() => {
                        tracing::debug!(
                            endpoint = %endpoint,
                            error = %e,
                            "Caching negative result"
                        );
                        Some((T::default(), self.config.negative_ttl))
                    }
                    Err(MapsError::Cancelled) => {
                        tracing::debug!(endpoint = %endpoint, "Maps request cancelled");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(endpoint = %endpoint, error = %e, "Maps request failed");
                        None
                    }
                }
            })
            .await;

        fetched.unwrap_or_default()
    }

    async fn fetch<T>(
        &self,
        kind: UsageKind,
        endpoint: &'static str,
        params: &QueryParams,
        parse: Parser<T>,
    ) -> Result<T, MapsError> {
        self.usage.check_limits()?;
        if self.cancel.is_cancelled() {
            return Err(MapsError::Cancelled);
        }

        self.usage.increment_usage(kind);
        tracing::debug!(
            endpoint = %endpoint,
            transport = self.transport.name(),
            "Maps proxy request"
        );

        let body = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(MapsError::Cancelled),
            result = self.transport.get_json(endpoint, params) => result?,
        };

        let status = response_status(&body)?;
        if !status.is_ok() {
            return Err(MapsError::Status(status));
        }
        parse(body)
    }
}

fn lat_lng(point: &GeoPoint) -> String {
    format!("{},{}", point.lat, point.lng)
}
