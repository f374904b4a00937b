//! `query` and `health` command handlers.

use std::process::ExitCode;

use planscope_cache::CacheStore;
use planscope_client::{ErrorDetails, NetworkStatus, PlanningDataService};
use planscope_core::{PlanningConfig, PlanningResult, QueryOptions};

pub(crate) struct QueryArgs {
    pub lat: f64,
    pub lng: f64,
    pub radius_m: u32,
    pub options: QueryOptions,
    pub offline: bool,
    pub no_cache: bool,
    pub json: bool,
}

/// Opens the configured cache store, or runs without one.
///
/// A cache that cannot be opened is logged and skipped; queries still work
/// against the live sources.
pub(crate) async fn open_cache(config: &PlanningConfig, no_cache: bool) -> Option<CacheStore> {
    if no_cache {
        return None;
    }
    match CacheStore::open(&config.cache_url).await {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(
                url = %config.cache_url,
                error = %e,
                "cache unavailable; continuing without it"
            );
            None
        }
    }
}

/// Runs one planning query and prints the outcome.
///
/// # Errors
///
/// Returns an error if the service cannot be constructed or the result
/// cannot be serialized. Query failures are printed and reported through
/// the exit code.
pub(crate) async fn run_query(config: PlanningConfig, args: QueryArgs) -> anyhow::Result<ExitCode> {
    let cache = open_cache(&config, args.no_cache).await;
    let network = if args.offline {
        NetworkStatus::offline()
    } else {
        NetworkStatus::online()
    };
    let service = PlanningDataService::new(config, cache.clone(), network)
        .map_err(|e| anyhow::anyhow!("failed to build planning service: {e}"))?;

    let outcome = service
        .query(args.lat, args.lng, args.radius_m, &args.options)
        .await;

    let code = match outcome {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_failure(&e);
            ExitCode::FAILURE
        }
    };

    service.flush_cache_writes().await;
    if let Some(cache) = cache {
        cache.close().await;
    }
    Ok(code)
}

pub(crate) async fn run_health(config: PlanningConfig) -> anyhow::Result<ExitCode> {
    let service = PlanningDataService::new(config, None, NetworkStatus::online())
        .map_err(|e| anyhow::anyhow!("failed to build planning service: {e}"))?;
    if service.check_health().await {
        println!("ok");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("unreachable");
        Ok(ExitCode::FAILURE)
    }
}

fn print_summary(result: &PlanningResult) {
    let authority = &result.local_authority;
    println!(
        "{}: approval rate {:.0}%, avg decision {} days, climate {:?}",
        authority.name,
        authority.approval_rate * 100.0,
        authority.avg_decision_days,
        authority.climate
    );

    println!("\n{} applications", result.applications.len());
    for app in &result.applications {
        println!(
            "  {:>5}m  {:<10}  {}  {}",
            app.distance_meters,
            app.status.to_string(),
            app.id,
            app.address
        );
    }

    println!("\n{} constraints", result.constraints.len());
    for constraint in &result.constraints {
        match &constraint.grade {
            Some(grade) => println!("  {}: {} (grade {grade})", constraint.dataset, constraint.name),
            None => println!("  {}: {}", constraint.dataset, constraint.name),
        }
    }
}

fn print_failure(err: &ErrorDetails) {
    eprintln!("{}", err.user_message);
    if err.retryable {
        eprintln!("(retryable)");
    } else {
        eprintln!("(not retryable)");
    }
    tracing::debug!(kind = %err.kind, error = %err.message, "query failed");
}
