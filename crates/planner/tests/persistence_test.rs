//! Planner state that outlives one process

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use trip_planner_core::ManualClock;
use trip_planner::maps::{MapsError, MapsTransport, QueryParams};
use trip_planner::usage::UsageKind;
use trip_planner::{Planner, PlannerConfig};

struct Everywhere;

#[async_trait]
impl MapsTransport for Everywhere {
    async fn get_json(&self, _endpoint: &str, _params: &QueryParams) -> Result<Value, MapsError> {
        Ok(json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Somewhere",
                "geometry": {"location": {"lat": 41.9, "lng": 12.5}}
            }]
        }))
    }
}

#[tokio::test]
async fn test_usage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_720_000_000_000));
    let config = PlannerConfig::default().usage_dir(dir.path());

    {
        let planner =
            Planner::with_transport(config.clone(), Arc::new(Everywhere), clock.clone()).await;
        planner.plan_day_route_from("Rome", &["Colosseum", "Pantheon"]).await;
        planner.flush();
    }

    let planner =
        Planner::with_transport(config.clone(), Arc::new(Everywhere), clock.clone()).await;
    let stats = planner.usage_stats();
    assert_eq!(stats.requests_today, 3);
    assert_eq!(stats.count(UsageKind::Geocode), 3);

    // Next day starts from zero
    clock.advance(Duration::from_secs(86_400));
    assert_eq!(planner.usage_stats().requests_today, 0);
}
