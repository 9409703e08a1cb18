//! Tiered cache
//!
//! Checks stores in order (fast local tier first, durable tiers after). A
//! live hit in a later tier is copied into the earlier ones with the same
//! expiry. Store failures are logged and treated as misses: the cache is an
//! optimisation and never fails the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use trip_planner_core::SharedClock;

use crate::{CacheConfig, CacheEntry, CacheError, CacheStore, SingleFlight};

/// Cache composed of one or more [`CacheStore`] tiers
pub struct TieredCache {
    tiers: Vec<Arc<dyn CacheStore>>,
    clock: SharedClock,
    config: CacheConfig,
    flights: SingleFlight<Value>,
}

impl TieredCache {
    /// Create a cache with no tiers; add them with [`TieredCache::with_tier`]
    pub fn new(config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            tiers: Vec::new(),
            clock,
            config,
            flights: SingleFlight::new(),
        }
    }

    /// Append a tier. Tiers are consulted in the order they were added.
    pub fn with_tier(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.tiers.push(store);
        self
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Find a live entry, back-filling faster tiers on a lower-tier hit
    pub async fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now_millis();

        for (depth, tier) in self.tiers.iter().enumerate() {
            match tier.load(key).await {
                Ok(Some(entry)) if entry.is_live(now) => {
                    if depth > 0 {
                        tracing::debug!(
                            key = %key,
                            tier = tier.name(),
                            "Back-filling faster tiers"
                        );
                        for faster in &self.tiers[..depth] {
                            if let Err(e) = faster.save(&entry).await {
                                tracing::warn!(
                                    key = %key,
                                    tier = faster.name(),
                                    error = %e,
                                    "Cache back-fill failed"
                                );
                            }
                        }
                    }
                    return Some(entry);
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(key = %key, tier = tier.name(), error = %e, "Cache read failed");
                }
            }
        }

        None
    }

    /// Get a live value, or `None` on miss, expiry or shape mismatch
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.get_entry(key).await?;
        match entry.decode() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Store a value in every tier
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, value, ttl).await;
        Ok(())
    }

    /// Store a JSON value in every tier; one tier failing does not stop the others
    pub async fn set_value(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry::new(key, value, self.clock.now_millis(), ttl);

        for tier in &self.tiers {
            if let Err(e) = tier.save(&entry).await {
                tracing::warn!(key = %key, tier = tier.name(), error = %e, "Cache write failed");
            }
        }
    }

    /// Remove matching entries from every tier; returns the total removed
    pub async fn invalidate(&self, prefix: &str) -> usize {
        let mut removed = 0;
        for tier in &self.tiers {
            match tier.remove_prefix(prefix).await {
                Ok(n) => removed += n,
                Err(e) => {
                    tracing::warn!(
                        prefix = %prefix,
                        tier = tier.name(),
                        error = %e,
                        "Cache invalidation failed"
                    );
                }
            }
        }
        removed
    }

    /// Empty every tier
    pub async fn clear(&self) -> usize {
        let mut removed = 0;
        for tier in &self.tiers {
            match tier.clear().await {
                Ok(n) => removed += n,
                Err(e) => tracing::warn!(tier = tier.name(), error = %e, "Cache clear failed"),
            }
        }
        removed
    }

    /// Return the cached value, or run `fetch` and cache what it yields.
    ///
    /// `fetch` picks the TTL for its own result, which lets callers cache
    /// negative answers briefly and positive ones for longer. A `None` from
    /// `fetch` is not cached. With `coalesce_requests` enabled, concurrent
    /// misses on the same key share one `fetch`; if that `fetch` yields
    /// `None` or its caller is dropped, a waiting caller runs its own.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<(T, Duration)>>,
    {
        if let Some(value) = self.get(key).await {
            return Some(value);
        }

        if !self.config.coalesce_requests {
            let (value, ttl) = fetch().await?;
            if let Err(e) = self.set(key, &value, ttl).await {
                tracing::warn!(key = %key, error = %e, "Fetched value could not be cached");
            }
            return Some(value);
        }

        // A fetch that yields nothing is not shared; a waiter runs its own
        let shared = self
            .flights
            .run(key, move || async move {
                let (value, ttl) = fetch().await.ok_or(())?;
                match serde_json::to_value(&value) {
                    Ok(json) => {
                        self.set_value(key, json.clone(), ttl).await;
                        Ok(json)
                    }
                    Err(e) => {
                        tracing::warn!(
                            key = %key,
                            error = %e,
                            "Fetched value could not be serialized"
                        );
                        Err(())
                    }
                }
            })
            .await
            .ok()?;

        match serde_json::from_value(shared) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Shared value has unexpected shape");
                None
            }
        }
    }
}
