//! Durable cache service over HTTP
//!
//! Second-tier store shared across sessions. The service speaks JSON:
//!
//! - `GET    {base}/entries/{key}`      → `CacheEntry` or 404
//! - `POST   {base}/entries`            ← `CacheEntry`
//! - `DELETE {base}/entries?prefix=..`  → `{"removed": n}`

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::{CacheConfig, CacheEntry, CacheError, CacheStore};

/// Cache store backed by a remote cache service
pub struct HttpCacheStore {
    client: Client,
    base_url: Url,
    config: CacheConfig,
}

#[derive(Debug, Deserialize)]
struct RemoveResponse {
    removed: usize,
}

impl HttpCacheStore {
    /// Create a store pointing at `base_url`
    pub fn new(base_url: &str, config: CacheConfig) -> Result<Self, CacheError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CacheError::Connection(format!("Failed to create client: {}", e)))?;
        Self::with_client(client, base_url, config)
    }

    /// Create a store with a preconfigured HTTP client
    pub fn with_client(
        client: Client,
        base_url: &str,
        config: CacheConfig,
    ) -> Result<Self, CacheError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            CacheError::InvalidConfig(format!("Invalid cache service URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CacheError::InvalidConfig(format!(
                "Cache service URL '{}' cannot be a base",
                base_url
            )));
        }

        tracing::info!(url = %base_url, prefix = %config.key_prefix, "Using HTTP cache service");

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn remote_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// URL for `{base}/entries[/{key}]`, with the key percent-encoded as one segment
    fn entries_url(&self, key: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("entries");
            if let Some(key) = key {
                segments.push(key);
            }
        }
        url
    }
}

#[async_trait]
impl CacheStore for HttpCacheStore {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let remote_key = self.remote_key(key);
        let response = self
            .client
            .get(self.entries_url(Some(&remote_key)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CacheError::Backend(format!(
                "Cache service returned {} for GET",
                response.status()
            )));
        }

        let mut entry: CacheEntry = response.json().await?;
        entry.key = key.to_string();
        tracing::debug!(key = %key, "HTTP cache HIT");
        Ok(Some(entry))
    }

    async fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut remote = entry.clone();
        remote.key = self.remote_key(&entry.key);

        let response = self
            .client
            .post(self.entries_url(None))
            .json(&remote)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CacheError::Backend(format!(
                "Cache service returned {} for POST",
                response.status()
            )));
        }

        tracing::debug!(key = %entry.key, "HTTP cache STORE");
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let remote_prefix = self.remote_key(prefix);
        let response = self
            .client
            .delete(self.entries_url(None))
            .query(&[("prefix", remote_prefix.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CacheError::Backend(format!(
                "Cache service returned {} for DELETE",
                response.status()
            )));
        }

        let body: RemoveResponse = response.json().await?;
        Ok(body.removed)
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        self.remove_prefix("").await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
