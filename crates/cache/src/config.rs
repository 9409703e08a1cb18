//! Cache configuration

use std::time::Duration;

/// Configuration for cache behavior
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// TTL used by `set_default` and when a fetch does not pick its own
    pub default_ttl: Duration,
    /// Prefix for keys written to durable stores (HTTP service, Redis)
    pub key_prefix: String,
    /// Share one in-flight fetch between concurrent callers of the same key.
    ///
    /// Off by default: turning it on reduces the number of upstream calls
    /// made during a burst of identical requests.
    pub coalesce_requests: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600), // 1 hour
            key_prefix: "trip-planner:cache:".to_string(),
            coalesce_requests: false,
        }
    }
}

impl CacheConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set default TTL
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set key prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Enable or disable single-flight request coalescing
    pub fn coalesce_requests(mut self, enable: bool) -> Self {
        self.coalesce_requests = enable;
        self
    }

    /// Geocode results rarely change (24 hours)
    pub fn geocode() -> Self {
        Self {
            default_ttl: Duration::from_secs(86400),
            key_prefix: "trip-planner:geocode:".to_string(),
            ..Default::default()
        }
    }

    /// Place searches and details (1 hour)
    pub fn places() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            key_prefix: "trip-planner:places:".to_string(),
            ..Default::default()
        }
    }

    /// Short-lived cache, used for negative results (5 minutes)
    pub fn short_lived() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            ..Default::default()
        }
    }
}
