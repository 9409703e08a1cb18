//! Error types for core geo operations

use thiserror::Error;

/// Errors raised when constructing geo values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Point name must not be empty")]
    EmptyName,

    #[error("Route of {len} points does not start and end at the same point")]
    OpenRoute { len: usize },
}
