//! TTL-based persistent cache for planning query results.
//!
//! Entries live in an SQLite table keyed by [`CacheKey`]. Every public
//! operation degrades to "cache miss" (or a no-op) when the database is
//! unavailable, so a storage failure never blocks a live fetch. Failures
//! are logged with `tracing` and swallowed at this boundary.

mod store;

use thiserror::Error;

pub use store::{CacheStats, CacheStore};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("cache payload (de)serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}
