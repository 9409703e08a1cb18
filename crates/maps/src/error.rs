//! Maps client errors
//!
//! These never reach callers of [`crate::MapsClient`]'s lookup methods;
//! they drive logging and the decision whether a result is cached.

use thiserror::Error;
use trip_planner_usage::UsageError;

use crate::ApiStatus;

#[derive(Error, Debug)]
pub enum MapsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Proxy returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Upstream status: {0}")]
    Status(ApiStatus),

    #[error("Response has no status field")]
    MissingStatus,

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Quota exceeded: {0}")]
    Quota(#[from] UsageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MapsError {
    /// Negative answers from upstream are cached briefly; everything else is not
    pub fn is_negative_result(&self) -> bool {
        matches!(self, MapsError::Status(status) if !status.is_ok())
    }
}
