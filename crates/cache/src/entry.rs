//! Cache entry types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::CacheError;

/// A cached value with its expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Full cache key
    pub key: String,
    /// Cached payload
    pub value: serde_json::Value,
    /// When the entry was written (Unix millis)
    pub created_at: i64,
    /// Last instant at which the entry is still live (Unix millis)
    pub expires_at: i64,
}

impl CacheEntry {
    /// Create an entry that expires `ttl` after `now_millis`
    pub fn new(
        key: impl Into<String>,
        value: serde_json::Value,
        now_millis: i64,
        ttl: Duration,
    ) -> Self {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            key: key.into(),
            value,
            created_at: now_millis,
            expires_at: now_millis.saturating_add(ttl_millis),
        }
    }

    /// Live while `now <= expires_at`
    pub fn is_live(&self, now_millis: i64) -> bool {
        now_millis <= self.expires_at
    }

    /// Time left before expiry, zero once dead
    pub fn remaining_ttl(&self, now_millis: i64) -> Duration {
        let left = self.expires_at.saturating_sub(now_millis);
        Duration::from_millis(left.max(0) as u64)
    }

    /// Deserialize the payload
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CacheError> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// Statistics for cache operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently held, live or not
    pub entries: usize,
    /// Total hits
    pub hits: u64,
    /// Total misses (including expired entries)
    pub misses: u64,
    /// Total stores
    pub stores: u64,
    /// Entries removed by invalidation
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}
