use crate::app_config::{
    PlanningConfig, DEFAULT_CACHE_URL, DEFAULT_PLANIT_BASE_URL, DEFAULT_PLANNING_DATA_BASE_URL,
    DEFAULT_USER_AGENT,
};
use crate::ConfigError;

/// Load planning configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_config() -> Result<PlanningConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from_env()
}

/// Load planning configuration from environment variables already in the process.
///
/// Unlike [`load_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_config_from_env() -> Result<PlanningConfig, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// Every variable is optional; absent ones fall back to
/// [`PlanningConfig::default`] values.
fn build_config<F>(lookup: F) -> Result<PlanningConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    };

    let parse_flag = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got \"{raw}\""),
            }),
            Err(_) => Ok(default),
        }
    };

    let defaults = PlanningConfig::default();

    let planit_base_url = or_default("PLANSCOPE_PLANIT_BASE_URL", DEFAULT_PLANIT_BASE_URL);
    let planning_data_base_url = or_default(
        "PLANSCOPE_PLANNING_DATA_BASE_URL",
        DEFAULT_PLANNING_DATA_BASE_URL,
    );
    let cache_url = or_default("PLANSCOPE_CACHE_URL", DEFAULT_CACHE_URL);
    let user_agent = or_default("PLANSCOPE_USER_AGENT", DEFAULT_USER_AGENT);
    let log_level = or_default("PLANSCOPE_LOG_LEVEL", &defaults.log_level);

    let planit_timeout_ms = parse_u64("PLANSCOPE_PLANIT_TIMEOUT_MS", defaults.planit_timeout_ms)?;
    let planit_page_size = parse_u32("PLANSCOPE_PLANIT_PAGE_SIZE", defaults.planit_page_size)?;
    let planning_data_timeout_ms = parse_u64(
        "PLANSCOPE_PLANNING_DATA_TIMEOUT_MS",
        defaults.planning_data_timeout_ms,
    )?;
    let constraint_limit = parse_u32("PLANSCOPE_CONSTRAINT_LIMIT", defaults.constraint_limit)?;
    let max_retries = parse_u32("PLANSCOPE_MAX_RETRIES", defaults.max_retries)?;
    let constraint_max_retries = parse_u32(
        "PLANSCOPE_CONSTRAINT_MAX_RETRIES",
        defaults.constraint_max_retries,
    )?;
    let initial_retry_delay_ms = parse_u64(
        "PLANSCOPE_INITIAL_RETRY_DELAY_MS",
        defaults.initial_retry_delay_ms,
    )?;
    let max_retry_delay_ms =
        parse_u64("PLANSCOPE_MAX_RETRY_DELAY_MS", defaults.max_retry_delay_ms)?;
    let rate_limit_ceiling_ms = parse_u64(
        "PLANSCOPE_RATE_LIMIT_CEILING_MS",
        defaults.rate_limit_ceiling_ms,
    )?;
    let health_timeout_ms = parse_u64("PLANSCOPE_HEALTH_TIMEOUT_MS", defaults.health_timeout_ms)?;
    let cache_ttl_ms = parse_u64("PLANSCOPE_CACHE_TTL_MS", defaults.cache_ttl_ms)?;
    let cache_enabled = parse_flag("PLANSCOPE_CACHE_ENABLED", defaults.cache_enabled)?;

    if max_retry_delay_ms < initial_retry_delay_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "PLANSCOPE_MAX_RETRY_DELAY_MS".to_string(),
            reason: format!(
                "must be at least PLANSCOPE_INITIAL_RETRY_DELAY_MS ({initial_retry_delay_ms})"
            ),
        });
    }

    Ok(PlanningConfig {
        planit_base_url,
        planit_timeout_ms,
        planit_page_size,
        planning_data_base_url,
        planning_data_timeout_ms,
        constraint_limit,
        max_retries,
        constraint_max_retries,
        initial_retry_delay_ms,
        max_retry_delay_ms,
        rate_limit_ceiling_ms,
        health_timeout_ms,
        cache_ttl_ms,
        cache_enabled,
        cache_url,
        user_agent,
        log_level,
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
