//! # Trip Planner
//!
//! Service core of the trip planner: geocodes suggested stops through the
//! cached, usage-tracked maps client and orders them into day routes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trip_planner::{Planner, PlannerConfig};
//!
//! let planner = Planner::new(PlannerConfig::from_env()?).await?;
//! if let Some(plan) = planner
//!     .plan_day_route_from("Hotel du Louvre, Paris", &["Musée d'Orsay", "Sainte-Chapelle"])
//!     .await
//! {
//!     for leg in plan.route.points() {
//!         println!("{}", leg.name);
//!     }
//! }
//! println!("{}", planner.usage_stats());
//! ```
//!
//! ## Crates
//!
//! - [`trip_planner_core`]: geo points, Haversine, routes, clocks
//! - [`trip_planner_cache`]: TTL and tiered caching
//! - [`trip_planner_usage`]: per-day and per-minute usage counters
//! - [`trip_planner_maps`]: maps proxy client

pub mod config;
pub mod error;
pub mod planner;

pub use config::*;
pub use error::*;
pub use planner::*;

pub use trip_planner_cache as cache;
pub use trip_planner_maps as maps;
pub use trip_planner_usage as usage;
