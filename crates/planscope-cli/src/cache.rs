//! `cache` command handlers.

use std::process::ExitCode;

use planscope_cache::CacheStore;
use planscope_core::PlanningConfig;

use crate::CacheCommands;

/// Runs a cache maintenance command against the configured store.
///
/// # Errors
///
/// Returns an error if the cache database cannot be opened. Individual
/// operations degrade to no-ops and log their own failures.
pub(crate) async fn run_cache(
    config: &PlanningConfig,
    command: CacheCommands,
) -> anyhow::Result<ExitCode> {
    let store = CacheStore::open(&config.cache_url)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open cache at {}: {e}", config.cache_url))?;

    match command {
        CacheCommands::Stats => {
            let stats = store.stats().await;
            println!("entries: {}", stats.count);
            match stats.oldest_timestamp {
                Some(oldest) => println!("oldest:  {}", oldest.to_rfc3339()),
                None => println!("oldest:  -"),
            }
        }
        CacheCommands::Sweep => {
            let removed = store.sweep_expired().await;
            println!("removed {removed} expired entries");
        }
        CacheCommands::Clear => {
            store.clear().await;
            println!("cache cleared");
        }
    }

    store.close().await;
    Ok(ExitCode::SUCCESS)
}
