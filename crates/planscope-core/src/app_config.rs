use std::time::Duration;

pub const DEFAULT_PLANIT_BASE_URL: &str = "https://www.planit.org.uk";
pub const DEFAULT_PLANNING_DATA_BASE_URL: &str = "https://www.planning.data.gov.uk";
pub const DEFAULT_CACHE_URL: &str = "sqlite://planscope-cache.db";
pub const DEFAULT_USER_AGENT: &str = "PlanScope/1.0 (planning-data)";

/// Runtime configuration for the planning retrieval layer.
///
/// Held by value by the service; nothing here is process-global.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningConfig {
    pub planit_base_url: String,
    pub planit_timeout_ms: u64,
    pub planit_page_size: u32,
    pub planning_data_base_url: String,
    pub planning_data_timeout_ms: u64,
    pub constraint_limit: u32,
    pub max_retries: u32,
    pub constraint_max_retries: u32,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub rate_limit_ceiling_ms: u64,
    pub health_timeout_ms: u64,
    pub cache_ttl_ms: u64,
    pub cache_enabled: bool,
    pub cache_url: String,
    pub user_agent: String,
    pub log_level: String,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            planit_base_url: DEFAULT_PLANIT_BASE_URL.to_string(),
            planit_timeout_ms: 15_000,
            planit_page_size: 50,
            planning_data_base_url: DEFAULT_PLANNING_DATA_BASE_URL.to_string(),
            planning_data_timeout_ms: 10_000,
            constraint_limit: 10,
            max_retries: 3,
            constraint_max_retries: 1,
            initial_retry_delay_ms: 1_000,
            max_retry_delay_ms: 8_000,
            rate_limit_ceiling_ms: 30_000,
            health_timeout_ms: 5_000,
            cache_ttl_ms: 24 * 60 * 60 * 1_000,
            cache_enabled: true,
            cache_url: DEFAULT_CACHE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl PlanningConfig {
    #[must_use]
    pub fn planit_timeout(&self) -> Duration {
        Duration::from_millis(self.planit_timeout_ms)
    }

    #[must_use]
    pub fn planning_data_timeout(&self) -> Duration {
        Duration::from_millis(self.planning_data_timeout_ms)
    }

    #[must_use]
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}
