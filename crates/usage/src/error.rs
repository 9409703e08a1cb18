//! Usage tracking errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Usage limit reached: {used}/{max} {window}")]
    LimitExceeded {
        window: &'static str,
        used: u64,
        max: u64,
    },
}
