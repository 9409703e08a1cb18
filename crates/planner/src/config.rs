//! Planner configuration

use std::path::PathBuf;
use trip_planner_cache::CacheConfig;
use trip_planner_maps::MapsConfig;
use trip_planner_usage::UsageLimits;

use crate::{PlannerError, Result};

/// Environment variable holding the durable cache service URL
pub const CACHE_SERVICE_URL_ENV: &str = "TRIP_PLANNER_CACHE_SERVICE_URL";

/// Environment variable holding the directory for usage records
pub const USAGE_DIR_ENV: &str = "TRIP_PLANNER_USAGE_DIR";

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub maps: MapsConfig,
    pub cache: CacheConfig,
    /// Durable cache tier; memory only when unset
    pub cache_service_url: Option<String>,
    /// Redis/Valkey durable tier
    #[cfg(feature = "redis")]
    pub redis_url: Option<String>,
    /// Directory for persisted usage; kept in memory when unset
    pub usage_dir: Option<PathBuf>,
    pub usage_namespace: String,
    pub usage_limits: UsageLimits,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            maps: MapsConfig::default(),
            cache: CacheConfig::default(),
            cache_service_url: None,
            #[cfg(feature = "redis")]
            redis_url: None,
            usage_dir: None,
            usage_namespace: "maps".to_string(),
            usage_limits: UsageLimits::unlimited(),
        }
    }
}

impl PlannerConfig {
    /// Build from `TRIP_PLANNER_MAPS_PROXY_URL` (required),
    /// `TRIP_PLANNER_CACHE_SERVICE_URL` and `TRIP_PLANNER_USAGE_DIR`
    pub fn from_env() -> Result<Self> {
        let maps = MapsConfig::from_env().map_err(|e| PlannerError::Config(e.to_string()))?;

        Ok(Self {
            maps,
            cache_service_url: non_empty_env(CACHE_SERVICE_URL_ENV),
            usage_dir: non_empty_env(USAGE_DIR_ENV).map(PathBuf::from),
            ..Default::default()
        })
    }

    pub fn maps(mut self, maps: MapsConfig) -> Self {
        self.maps = maps;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache_service_url(mut self, url: impl Into<String>) -> Self {
        self.cache_service_url = Some(url.into());
        self
    }

    #[cfg(feature = "redis")]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn usage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.usage_dir = Some(dir.into());
        self
    }

    pub fn usage_limits(mut self, limits: UsageLimits) -> Self {
        self.usage_limits = limits;
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
