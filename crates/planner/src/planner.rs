//! Planner service facade

use futures::future::join_all;
use std::sync::Arc;
use trip_planner_cache::{CacheBuilder, TieredCache};
use trip_planner_core::{nearest_neighbor_route, GeoPoint, Route, SharedClock, SystemClock};
use trip_planner_maps::{HttpTransport, MapsClient, MapsTransport};
use trip_planner_usage::{FileUsageStore, MemoryUsageStore, UsageStats, UsageStore, UsageTracker};

use crate::{PlannerConfig, Result};

/// Route for one day plus the stops that could not be placed on it
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub route: Route,
    /// Stop names that did not geocode, in input order
    pub unresolved: Vec<String>,
}

impl DayPlan {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Owns the cache, usage tracker and maps client for one process
pub struct Planner {
    cache: Arc<TieredCache>,
    usage: Arc<UsageTracker>,
    maps: MapsClient,
}

impl Planner {
    /// Planner talking to the configured maps proxy over HTTP
    pub async fn new(config: PlannerConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.maps)?;
        tracing::info!(proxy = %config.maps.proxy_base_url, "Using maps proxy");
        Ok(Self::with_transport(config, Arc::new(transport), SystemClock::shared()).await)
    }

    /// Planner with an explicit transport and clock
    pub async fn with_transport(
        config: PlannerConfig,
        transport: Arc<dyn MapsTransport>,
        clock: SharedClock,
    ) -> Self {
        let mut builder = CacheBuilder::new().config(config.cache.clone()).clock(clock.clone());
        if let Some(url) = &config.cache_service_url {
            builder = builder.http_url(url.clone());
        }
        #[cfg(feature = "redis")]
        if let Some(url) = &config.redis_url {
            builder = builder.redis_url(url.clone());
        }
        let cache = Arc::new(builder.build().await);

        let store: Arc<dyn UsageStore> = match &config.usage_dir {
            Some(dir) => Arc::new(FileUsageStore::new(dir.clone())),
            None => Arc::new(MemoryUsageStore::new()),
        };
        let usage = UsageTracker::new(&config.usage_namespace, store, clock)
            .with_limits(config.usage_limits.clone());
        if usage.load() {
            tracing::debug!(key = %usage.storage_key(), "Loaded persisted usage");
        }
        let usage = Arc::new(usage);

        let maps = MapsClient::new(config.maps, transport, cache.clone(), usage.clone());

        Self { cache, usage, maps }
    }

    pub fn maps(&self) -> &MapsClient {
        &self.maps
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Geocode each stop, then order them into a circular route from `start`.
    ///
    /// Stops are geocoded concurrently; the route keeps the nearest-neighbor
    /// order regardless of which lookup finished first.
    pub async fn plan_day_route<S: AsRef<str>>(&self, start: &GeoPoint, stops: &[S]) -> DayPlan {
        let lookups = stops.iter().map(|stop| {
            let name = stop.as_ref();
            async move { (name, self.maps.geocode(name).await) }
        });

        let mut points = Vec::with_capacity(stops.len());
        let mut unresolved = Vec::new();
        for (name, result) in join_all(lookups).await {
            match result {
                Some(found) => points.push(found.to_geo_point(name)),
                None => unresolved.push(name.to_string()),
            }
        }

        if !unresolved.is_empty() {
            tracing::warn!(count = unresolved.len(), "Some stops could not be geocoded");
        }

        DayPlan {
            route: nearest_neighbor_route(start, &points),
            unresolved,
        }
    }

    /// Like [`Planner::plan_day_route`] with a start address. `None` when
    /// the start does not geocode.
    pub async fn plan_day_route_from<S: AsRef<str>>(
        &self,
        start_address: &str,
        stops: &[S],
    ) -> Option<DayPlan> {
        let start = self.maps.geocode(start_address).await?.to_geo_point(start_address);
        Some(self.plan_day_route(&start, stops).await)
    }

    /// Current usage, re-read from storage
    pub fn usage_stats(&self) -> UsageStats {
        self.usage.get_usage_stats()
    }

    pub fn reset_usage(&self) {
        self.usage.reset_usage_stats();
    }

    /// Drop cached entries whose key starts with `prefix` (e.g., "geocode")
    pub async fn invalidate(&self, prefix: &str) -> usize {
        self.cache.invalidate(prefix).await
    }

    /// Persist usage before shutdown
    pub fn flush(&self) {
        self.usage.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trip_planner_core::ManualClock;
    use trip_planner_maps::{MapsError, QueryParams};

    /// Answers geocode requests from a fixed table
    struct Gazetteer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MapsTransport for Gazetteer {
        async fn get_json(
            &self,
            _endpoint: &str,
            params: &QueryParams,
        ) -> std::result::Result<Value, MapsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let coords = match params.get("address").map(String::as_str) {
                Some("Hotel") => Some((48.8700, 2.3300)),
                Some("Louvre") => Some((48.8606, 2.3376)),
                Some("Eiffel Tower") => Some((48.8584, 2.2945)),
                Some("Sacre-Coeur") => Some((48.8867, 2.3431)),
                _ => None,
            };
            Ok(match coords {
                Some((lat, lng)) => json!({
                    "status": "OK",
                    "results": [{
                        "formatted_address": params["address"],
                        "geometry": {"location": {"lat": lat, "lng": lng}}
                    }]
                }),
                None => json!({"status": "ZERO_RESULTS", "results": []}),
            })
        }
    }

    async fn planner() -> (Planner, Arc<Gazetteer>) {
        let transport = Arc::new(Gazetteer {
            calls: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::new(0));
        let planner =
            Planner::with_transport(PlannerConfig::default(), transport.clone(), clock).await;
        (planner, transport)
    }

    #[tokio::test]
    async fn test_plan_orders_stops_and_reports_unresolved() {
        let (planner, _) = planner().await;
        let start = GeoPoint::new("Hotel", 48.8700, 2.3300);

        let plan = planner
            .plan_day_route(&start, &["Eiffel Tower", "Atlantis", "Louvre", "Sacre-Coeur"])
            .await;

        let names: Vec<&str> = plan.route.points().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Hotel", "Louvre", "Sacre-Coeur", "Eiffel Tower", "Hotel"]);
        assert_eq!(plan.unresolved, vec!["Atlantis".to_string()]);
        assert!(!plan.is_complete());
    }

    #[tokio::test]
    async fn test_replanning_is_served_from_cache() {
        let (planner, transport) = planner().await;
        let stops = ["Louvre", "Eiffel Tower"];

        let first = planner.plan_day_route_from("Hotel", &stops).await.expect("start");
        assert!(first.is_complete());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(planner.usage_stats().requests_today, 3);

        let second = planner.plan_day_route_from("Hotel", &stops).await.expect("start");
        assert_eq!(first, second);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);

        assert_eq!(planner.invalidate("geocode").await, 3);
        planner.plan_day_route_from("Hotel", &stops).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_unknown_start_yields_no_plan() {
        let (planner, _) = planner().await;
        assert!(planner.plan_day_route_from("Atlantis", &["Louvre"]).await.is_none());
    }

    #[tokio::test]
    async fn test_reset_usage() {
        let (planner, _) = planner().await;
        planner.plan_day_route_from("Hotel", &["Louvre"]).await;
        assert_eq!(planner.usage_stats().requests_today, 2);

        planner.reset_usage();
        planner.reset_usage();
        assert_eq!(planner.usage_stats().requests_today, 0);
    }
}
