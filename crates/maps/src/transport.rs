//! Transport to the maps proxy

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{MapsConfig, MapsError};

/// Query parameters of one proxy request. Ordered so they hash stably.
pub type QueryParams = BTreeMap<&'static str, String>;

/// Fetches raw JSON bodies from the maps proxy
#[async_trait]
pub trait MapsTransport: Send + Sync {
    /// `GET {base}/{endpoint}?{params}`
    async fn get_json(&self, endpoint: &str, params: &QueryParams) -> Result<Value, MapsError>;

    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// reqwest-based transport
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &MapsConfig) -> Result<Self, MapsError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MapsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.proxy_base_url))
    }

    /// Use a preconfigured client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl MapsTransport for HttpTransport {
    async fn get_json(&self, endpoint: &str, params: &QueryParams) -> Result<Value, MapsError> {
        let response = self.client.get(self.endpoint_url(endpoint)).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapsError::HttpStatus(status.as_u16()));
        }

        Ok(response.json().await?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
