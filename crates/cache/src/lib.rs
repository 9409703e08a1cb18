//! Caching for trip-planner
//!
//! Keeps repeated lookups (geocodes, place searches, directions) away from
//! metered external APIs. Values are stored with a per-entry TTL and keyed by
//! a stable hash of the request parameters.
//!
//! Backends:
//!
//! - **In-Memory**: [`MemoryCache`], the first tier (default)
//! - **HTTP**: [`HttpCacheStore`], a durable cache service shared across sessions
//! - **Redis/Valkey**: [`RedisCacheStore`], durable cache for multi-instance deployments
//!
//! [`TieredCache`] strings stores together: check tier 1, then tier 2,
//! populate earlier tiers on a later-tier hit, and write every tier on a miss.
//!
//! # Features
//!
//! - `http` (default): Enable the HTTP cache-service backend
//! - `redis`: Enable Redis/Valkey backend
//! - `full`: Enable all backends
//!
//! # Example
//!
//! ```rust,ignore
//! use trip_planner_cache::{cache_key, CacheBuilder, CacheConfig};
//!
//! let cache = CacheBuilder::new()
//!     .config(CacheConfig::geocode())
//!     .http_url("https://cache.example.com/v1")
//!     .build()
//!     .await;
//!
//! let key = cache_key("geocode", &serde_json::json!({"address": "Paris, France"}))?;
//! let coords: Option<Coords> = cache.get(&key).await;
//! ```

mod config;
mod entry;
mod error;
mod key;
mod memory;
mod single_flight;
mod tiered;
mod traits;

#[cfg(feature = "http")]
mod http_backend;

#[cfg(feature = "redis")]
mod redis_backend;

pub use config::CacheConfig;
pub use entry::{CacheEntry, CacheStats};
pub use error::CacheError;
pub use key::{cache_key, cache_key_for_value};
pub use memory::MemoryCache;
pub use single_flight::SingleFlight;
pub use tiered::TieredCache;
pub use traits::CacheStore;

#[cfg(feature = "http")]
pub use http_backend::HttpCacheStore;

#[cfg(feature = "redis")]
pub use redis_backend::RedisCacheStore;

use std::sync::Arc;
use trip_planner_core::{SharedClock, SystemClock};

/// Builder for a [`TieredCache`] that degrades to fewer tiers when a
/// durable backend cannot be set up
pub struct CacheBuilder {
    config: CacheConfig,
    clock: SharedClock,
    memory: Option<Arc<MemoryCache>>,
    #[cfg(feature = "http")]
    http_url: Option<String>,
    #[cfg(feature = "redis")]
    redis_url: Option<String>,
}

impl CacheBuilder {
    /// Create a new cache builder
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            clock: SystemClock::shared(),
            memory: None,
            #[cfg(feature = "http")]
            http_url: None,
            #[cfg(feature = "redis")]
            redis_url: None,
        }
    }

    /// Set cache configuration
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the clock used for expiry
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Use an existing in-memory tier instead of creating one
    pub fn memory(mut self, memory: Arc<MemoryCache>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Add the HTTP cache service as a durable tier
    #[cfg(feature = "http")]
    pub fn http_url(mut self, url: impl Into<String>) -> Self {
        self.http_url = Some(url.into());
        self
    }

    /// Add Redis/Valkey as a durable tier
    #[cfg(feature = "redis")]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Build the cache. A durable tier that fails to initialise is skipped
    /// with a warning; the in-memory tier is always present.
    pub async fn build(self) -> TieredCache {
        let memory = self
            .memory
            .unwrap_or_else(|| Arc::new(MemoryCache::new(self.config.clone(), self.clock.clone())));

        #[allow(unused_mut)]
        let mut cache = TieredCache::new(self.config.clone(), self.clock.clone()).with_tier(memory);

        #[cfg(feature = "http")]
        if let Some(url) = self.http_url {
            match HttpCacheStore::new(&url, self.config.clone()) {
                Ok(store) => cache = cache.with_tier(Arc::new(store)),
                Err(e) => {
                    tracing::warn!("HTTP cache service unavailable: {}. Using memory only.", e)
                }
            }
        }

        #[cfg(feature = "redis")]
        if let Some(url) = self.redis_url {
            match RedisCacheStore::new(&url, self.config.clone(), self.clock.clone()).await {
                Ok(store) => cache = cache.with_tier(Arc::new(store)),
                Err(e) => tracing::warn!("Failed to connect to Redis/Valkey: {}", e),
            }
        }

        cache
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
