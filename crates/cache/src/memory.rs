//! In-memory TTL cache

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use trip_planner_core::{SharedClock, SystemClock};

use crate::{CacheConfig, CacheEntry, CacheError, CacheStats, CacheStore};

/// In-memory key-value cache with per-entry TTL.
///
/// There is no eviction besides expiry: a dead entry stays in the map until
/// it is overwritten, invalidated, or swept by [`MemoryCache::purge_expired`].
/// Population grows with the number of distinct queries issued, which is the
/// intended bound.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: SharedClock,
    config: CacheConfig,
    stats: MemoryCacheStats,
}

#[derive(Default)]
struct MemoryCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    invalidations: AtomicU64,
}

impl MemoryCache {
    /// Create a new memory cache reading time from `clock`
    pub fn new(config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            config,
            stats: MemoryCacheStats::default(),
        }
    }

    /// Create with default config and the system clock
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default(), SystemClock::shared())
    }

    /// Get a live value, or `None` if absent, expired or of the wrong shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.get_entry(key)?;
        match entry.decode() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Get a live entry
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now_millis();
        let entries = self.entries.read();

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache HIT");
                Some(entry.clone())
            }
            _ => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value that expires `ttl` from now
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, value, ttl);
        Ok(())
    }

    /// Store a value with the configured default TTL
    pub fn set_default<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        self.set(key, value, self.config.default_ttl)
    }

    /// Store a JSON value that expires `ttl` from now
    pub fn set_value(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let entry = CacheEntry::new(key, value, self.clock.now_millis(), ttl);
        self.put_entry(entry);
    }

    /// Store a prepared entry as-is, keeping its expiry
    pub fn put_entry(&self, entry: CacheEntry) {
        tracing::debug!(key = %entry.key, expires_at = entry.expires_at, "Cache STORE");
        self.entries.write().insert(entry.key.clone(), entry);
        self.stats.stores.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove every entry whose key equals or starts with `prefix`
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();

        self.stats
            .invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        tracing::debug!(prefix = %prefix, removed, "Cache INVALIDATE");
        removed
    }

    /// Drop entries that have expired; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Remove all entries
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of entries held, including dead ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            stores: self.stats.stores.load(Ordering::Relaxed),
            invalidations: self.stats.invalidations.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.get_entry(key))
    }

    async fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.put_entry(entry.clone());
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        Ok(self.invalidate(prefix))
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        Ok(MemoryCache::clear(self))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
