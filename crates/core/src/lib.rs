//! # Trip Planner Core
//!
//! Core types shared by the trip-planner crates.
//!
//! - [`GeoPoint`] and great-circle distance ([`haversine_km`])
//! - [`Route`] and the greedy nearest-neighbor route builder
//! - [`Clock`] so time-dependent code can be driven by tests

pub mod clock;
pub mod errors;
pub mod geo;
pub mod route;

pub use clock::*;
pub use errors::*;
pub use geo::*;
pub use route::*;
