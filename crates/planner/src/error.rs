//! Planner errors

use thiserror::Error;
use trip_planner_maps::MapsError;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Maps client error: {0}")]
    Maps(#[from] MapsError),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
