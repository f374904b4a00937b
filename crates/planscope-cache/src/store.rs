use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use planscope_core::CacheKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const FILE_POOL_MAX_CONNECTIONS: u32 = 4;

/// Summary of what the cache currently holds, expired entries included
/// until they are read or swept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub count: u64,
    pub oldest_timestamp: Option<DateTime<Utc>>,
}

/// Persistent key/value cache with per-entry TTL.
///
/// Cloning is cheap and clones share the same pool. Writes are single-key
/// upserts, so concurrent writers for the same key converge on one row.
#[derive(Debug, Clone)]
pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    /// Opens (creating if missing) the SQLite database at `url` and applies
    /// the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Sqlx`] if the URL is invalid or the database
    /// cannot be opened, or [`CacheError::Migration`] if the schema cannot
    /// be applied.
    pub async fn open(url: &str) -> Result<Self, CacheError> {
        if is_memory_url(url) {
            return Self::open_in_memory().await;
        }
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_POOL_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds exactly one connection that never idles out: each
    /// SQLite in-memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the connection or migration fails.
    pub async fn open_in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, CacheError> {
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns the cached payload for `key`, or `None` when absent, expired,
    /// undecodable, or the store is unavailable. Expired and undecodable
    /// entries are deleted before returning.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.try_get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed");
                None
            }
        }
    }

    /// Stores `payload` under `key`, replacing any previous entry and
    /// restarting its TTL.
    pub async fn set<T: Serialize>(&self, key: &CacheKey, payload: &T, ttl: Duration) {
        if let Err(e) = self.try_set(key, payload, ttl).await {
            tracing::warn!(key = %key, error = %e, "cache write failed");
        }
    }

    pub async fn delete(&self, key: &CacheKey) {
        if let Err(e) = self.try_delete(key).await {
            tracing::warn!(key = %key, error = %e, "cache delete failed");
        }
    }

    /// Removes every expired entry and returns how many were removed.
    pub async fn sweep_expired(&self) -> u64 {
        match self.try_sweep_expired().await {
            Ok(removed) => {
                tracing::debug!(removed, "swept expired cache entries");
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "cache sweep failed");
                0
            }
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %e, "cache clear failed");
        }
    }

    pub async fn stats(&self) -> CacheStats {
        match self.try_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "cache stats failed");
                CacheStats::default()
            }
        }
    }

    /// Closes the underlying pool. Later operations behave as misses.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn try_get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        let row: Option<(String, i64, i64)> = sqlx::query_as(
            "SELECT payload, created_at_ms, ttl_ms FROM cache_entries WHERE key = ?1",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some((payload, created_at_ms, ttl_ms)) = row else {
            tracing::debug!(key = %key, "cache miss");
            return Ok(None);
        };

        if is_expired(now_ms(), created_at_ms, ttl_ms) {
            tracing::debug!(key = %key, "cache entry expired");
            self.try_delete(key).await?;
            return Ok(None);
        }

        match serde_json::from_str::<T>(&payload) {
            Ok(value) => {
                tracing::debug!(key = %key, "cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                self.try_delete(key).await?;
                Ok(None)
            }
        }
    }

    async fn try_set<T: Serialize>(
        &self,
        key: &CacheKey,
        payload: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(payload)?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        sqlx::query(
            "INSERT INTO cache_entries (key, payload, created_at_ms, ttl_ms) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(key) DO UPDATE SET \
                 payload = excluded.payload, \
                 created_at_ms = excluded.created_at_ms, \
                 ttl_ms = excluded.ttl_ms",
        )
        .bind(key.as_str())
        .bind(payload)
        .bind(now_ms())
        .bind(ttl_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn try_sweep_expired(&self) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE ?1 - created_at_ms > ttl_ms")
            .bind(now_ms())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn try_stats(&self) -> Result<CacheStats, CacheError> {
        let (count, oldest): (i64, Option<i64>) =
            sqlx::query_as("SELECT COUNT(*), MIN(created_at_ms) FROM cache_entries")
                .fetch_one(&self.pool)
                .await?;
        Ok(CacheStats {
            count: u64::try_from(count).unwrap_or(0),
            oldest_timestamp: oldest.and_then(DateTime::from_timestamp_millis),
        })
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// An entry is valid while `now - created_at <= ttl`.
fn is_expired(now_ms: i64, created_at_ms: i64, ttl_ms: i64) -> bool {
    now_ms.saturating_sub(created_at_ms) > ttl_ms
}

fn is_memory_url(url: &str) -> bool {
    matches!(url, "sqlite::memory:" | ":memory:" | "sqlite://:memory:")
}
