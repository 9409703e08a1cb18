//! # Usage Tracking
//!
//! Per-day and per-minute counters for calls to metered external APIs
//! (maps lookups, AI generation), with pluggable durable storage.
//!
//! ```rust,ignore
//! use trip_planner_usage::{UsageKind, UsageTracker, FileUsageStore};
//!
//! let store = Arc::new(FileUsageStore::new(dir));
//! let tracker = UsageTracker::new("maps", store, SystemClock::shared());
//! tracker.load();
//! tracker.increment_usage(UsageKind::Geocode);
//! println!("{}", tracker.get_usage_stats());
//! ```

pub mod error;
pub mod stats;
pub mod store;
pub mod tracker;

pub use error::*;
pub use stats::*;
pub use store::*;
pub use tracker::*;
