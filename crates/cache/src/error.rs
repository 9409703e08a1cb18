//! Cache error types

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl CacheError {
    /// Check if error is transient and operation can be retried
    pub fn is_transient(&self) -> bool {
        match self {
            CacheError::Connection(_) | CacheError::Backend(_) => true,
            #[cfg(feature = "http")]
            CacheError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
