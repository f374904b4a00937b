//! Public entry point of the retrieval layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use planscope_cache::{CacheStats, CacheStore};
use planscope_core::{CacheKey, PlanningConfig, PlanningResult, QueryOptions};
use tokio::task::JoinHandle;

use crate::constraints::ConstraintAggregator;
use crate::error::{BuildError, ErrorDetails};
use crate::executor::{RequestExecutor, RetryPolicy};
use crate::network::NetworkStatus;
use crate::planit::PlanItClient;
use crate::stats::derive_authority_stats;

/// Cache-first, offline-aware planning data lookup.
///
/// Holds its own configuration; two services never share settings. The
/// cache store is optional: without one every read is a miss and writes
/// are skipped.
pub struct PlanningDataService {
    config: PlanningConfig,
    planit: PlanItClient,
    constraints: ConstraintAggregator,
    cache: Option<CacheStore>,
    network: NetworkStatus,
    caching_enabled: AtomicBool,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl PlanningDataService {
    /// Builds the service and its HTTP clients from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if either base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(
        config: PlanningConfig,
        cache: Option<CacheStore>,
        network: NetworkStatus,
    ) -> Result<Self, BuildError> {
        let executor = RequestExecutor::new(
            &config.user_agent,
            network.clone(),
            RetryPolicy::from_config(&config),
        )?;
        let planit = PlanItClient::new(
            executor.clone(),
            &config.planit_base_url,
            config.planit_timeout(),
            config.planit_page_size,
            config.max_retries,
        )?;
        let constraints = ConstraintAggregator::new(
            executor,
            &config.planning_data_base_url,
            config.planning_data_timeout(),
            config.constraint_max_retries,
            config.constraint_limit,
        )?;

        Ok(Self {
            caching_enabled: AtomicBool::new(config.cache_enabled),
            config,
            planit,
            constraints,
            cache,
            network,
            pending_writes: Mutex::new(Vec::new()),
        })
    }

    /// Looks up planning applications and constraints around a point.
    ///
    /// 1. Cache-first when caching is enabled, no date filter is set and
    ///    `skip_cache` is false.
    /// 2. Offline: any cached entry for the point, else [`ErrorKind::Offline`].
    /// 3. Primary and constraint fetches run concurrently; only the primary
    ///    can fail the query.
    /// 4. Unfiltered results are written back to the cache in a detached
    ///    task.
    ///
    /// # Errors
    ///
    /// Returns the primary source's classified failure, or
    /// [`ErrorKind::Offline`] when offline with nothing cached.
    ///
    /// [`ErrorKind::Offline`]: crate::ErrorKind::Offline
    pub async fn query(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        options: &QueryOptions,
    ) -> Result<PlanningResult, ErrorDetails> {
        let key = CacheKey::for_query(lat, lng, radius_m);
        let cacheable = !options.has_date_filter();

        if self.is_caching_enabled() && cacheable && !options.skip_cache {
            if let Some(hit) = self.read_cache(&key).await {
                tracing::debug!(key = %key, "serving planning data from cache");
                return Ok(hit);
            }
        }

        if !self.network.is_online() {
            if let Some(hit) = self.read_cache(&key).await {
                tracing::info!(key = %key, "offline; serving cached planning data");
                return Ok(hit);
            }
            tracing::info!(key = %key, "offline with no cached planning data");
            return Err(ErrorDetails::offline());
        }

        let (applications, constraints) = tokio::try_join!(
            self.planit.fetch_applications(lat, lng, radius_m, options),
            async { Ok::<_, ErrorDetails>(self.constraints.fetch_constraints(lat, lng).await) },
        )
        .inspect_err(|e| {
            tracing::error!(
                kind = %e.kind,
                error = %e.message,
                "primary planning source failed"
            );
        })?;

        let local_authority = derive_authority_stats(&applications);
        let result = PlanningResult {
            applications,
            local_authority,
            constraints,
        };

        if cacheable {
            self.write_cache_detached(key, result.clone());
        }

        Ok(result)
    }

    /// Single attempt, no retries, against the primary API.
    pub async fn check_health(&self) -> bool {
        self.planit.check_health(self.config.health_timeout()).await
    }

    /// Toggles the cache-first read for subsequent queries. Offline
    /// fallback and write-back are unaffected.
    pub fn set_caching_enabled(&self, enabled: bool) {
        self.caching_enabled.store(enabled, Ordering::Relaxed);
    }

    /// `true` when the toggle is on and a cache store is attached.
    pub fn is_caching_enabled(&self) -> bool {
        self.caching_enabled.load(Ordering::Relaxed) && self.cache.is_some()
    }

    #[must_use]
    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    #[must_use]
    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub async fn cache_stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => cache.stats().await,
            None => CacheStats::default(),
        }
    }

    pub async fn sweep_expired_cache(&self) -> u64 {
        match &self.cache {
            Some(cache) => cache.sweep_expired().await,
            None => 0,
        }
    }

    /// Waits for detached cache writes started so far. Hosts that exit
    /// right after a query call this so the write-back is not lost.
    pub async fn flush_cache_writes(&self) {
        let handles = std::mem::take(
            &mut *self
                .pending_writes
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "cache write task failed");
            }
        }
    }

    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
    }

    async fn read_cache(&self, key: &CacheKey) -> Option<PlanningResult> {
        self.cache.as_ref()?.get(key).await
    }

    fn write_cache_detached(&self, key: CacheKey, result: PlanningResult) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let ttl = self.config.cache_ttl();
        // CacheStore::set logs its own failures; the query never awaits this.
        let handle = tokio::spawn(async move {
            cache.set(&key, &result, ttl).await;
            tracing::debug!(key = %key, "cached planning result");
        });
        let mut pending = self
            .pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}
