//! Shared domain model for PlanScope.
//!
//! Canonical planning records, constraint datasets, derived authority
//! statistics, the coordinate fingerprint used to address cached results,
//! and configuration loading. Nothing in this crate performs I/O beyond
//! reading environment variables.

pub mod app_config;
pub mod config;
pub mod geo;
pub mod planning;

use thiserror::Error;

pub use app_config::PlanningConfig;
pub use config::{load_config, load_config_from_env};
pub use geo::{haversine_distance_m, CacheKey};
pub use planning::{
    ApplicationStatus, ConstraintDataset, LocalAuthorityStats, PlanningApplication,
    PlanningClimate, PlanningConstraint, PlanningResult, QueryOptions,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
