//! Maps proxy client for trip-planner
//!
//! Wraps the server-side maps proxy (geocoding, place search, place details,
//! directions, autocomplete) with a [`TieredCache`](trip_planner_cache::TieredCache)
//! and a [`UsageTracker`](trip_planner_usage::UsageTracker). Lookups never
//! fail: errors are logged and surface as `None` or an empty `Vec`.
//!
//! # Example
//!
//! ```rust,ignore
//! use trip_planner_maps::{MapsClient, MapsConfig};
//!
//! let client = MapsClient::with_http(MapsConfig::from_env()?, cache, usage)?;
//! if let Some(paris) = client.geocode("Paris, France").await {
//!     println!("{}, {}", paris.lat, paris.lng);
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod status;
pub mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use models::{
    response_status, DirectionsSummary, GeocodeResult, PlaceDetails, PlaceSummary, Prediction,
    RouteLeg, TravelMode,
};
pub use status::*;
pub use transport::*;
