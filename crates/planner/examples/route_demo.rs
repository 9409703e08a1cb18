//! Plan a day in Paris
//!
//! Uses the maps proxy at `TRIP_PLANNER_MAPS_PROXY_URL` when set, otherwise
//! a small built-in gazetteer so the demo runs offline.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p trip-planner --example route_demo
//! ```

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trip_planner::maps::{MapsError, MapsTransport, QueryParams, TravelMode};
use trip_planner::{Planner, PlannerConfig};
use trip_planner_core::SystemClock;

/// Offline stand-in for the maps proxy
struct Gazetteer;

#[async_trait]
impl MapsTransport for Gazetteer {
    async fn get_json(&self, endpoint: &str, params: &QueryParams) -> Result<Value, MapsError> {
        if endpoint == "directions" {
            return Ok(json!({
                "status": "OK",
                "routes": [{"legs": [{"distance": {"value": 2900}, "duration": {"value": 2100}}]}]
            }));
        }

        let coords = match params.get("address").map(String::as_str) {
            Some("Hotel du Louvre, Paris") => (48.8627, 2.3358),
            Some("Musée d'Orsay") => (48.8600, 2.3266),
            Some("Sainte-Chapelle") => (48.8554, 2.3450),
            Some("Centre Pompidou") => (48.8607, 2.3522),
            Some("Jardin du Luxembourg") => (48.8462, 2.3372),
            _ => return Ok(json!({"status": "ZERO_RESULTS", "results": []})),
        };

        Ok(json!({
            "status": "OK",
            "results": [{
                "formatted_address": params["address"],
                "geometry": {"location": {"lat": coords.0, "lng": coords.1}}
            }]
        }))
    }

    fn name(&self) -> &'static str {
        "gazetteer"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let planner = match PlannerConfig::from_env() {
        Ok(config) => Planner::new(config).await?,
        Err(_) => {
            println!("TRIP_PLANNER_MAPS_PROXY_URL not set, using the offline gazetteer\n");
            Planner::with_transport(
                PlannerConfig::default(),
                Arc::new(Gazetteer),
                SystemClock::shared(),
            )
            .await
        }
    };

    let stops = [
        "Centre Pompidou",
        "Jardin du Luxembourg",
        "Musée d'Orsay",
        "Sainte-Chapelle",
        "Atlantis",
    ];

    let Some(plan) = planner.plan_day_route_from("Hotel du Louvre, Paris", &stops).await else {
        println!("Could not geocode the hotel");
        return Ok(());
    };

    println!("🗺️  Day route ({:.2} km as the crow flies)\n", plan.route.total_distance_km());
    for (from, to, km) in plan.route.legs() {
        println!("   {} → {} ({:.2} km)", from.name, to.name, km);
    }
    if !plan.is_complete() {
        println!("\n   Not found: {}", plan.unresolved.join(", "));
    }

    if let [first, second, ..] = plan.route.points() {
        let walk = planner
            .maps()
            .directions_between(first, second, TravelMode::Walking)
            .await;
        if let Some(walk) = walk {
            println!(
                "\n🚶 First leg on foot: {} m, {} min",
                walk.distance_meters,
                walk.duration_seconds / 60
            );
        }
    }

    // Same stops again: all geocodes come from the cache
    planner.plan_day_route_from("Hotel du Louvre, Paris", &stops).await;

    println!("\n{}", planner.usage_stats());
    planner.flush();

    Ok(())
}
