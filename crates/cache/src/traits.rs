//! Cache trait definitions

use async_trait::async_trait;

use crate::{CacheEntry, CacheError};

/// A backing store for one cache tier.
///
/// Stores hold raw entries. They may return entries that have already
/// expired; deciding liveness is the caller's job (see [`crate::TieredCache`]).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load an entry by full key
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Store an entry, replacing any previous entry under the same key
    async fn save(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Remove every entry whose key equals or starts with `prefix`
    async fn remove_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Remove all entries
    async fn clear(&self) -> Result<usize, CacheError>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
