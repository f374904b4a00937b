mod cache;
mod query;

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "planscope")]
#[command(about = "Planning applications and constraints around a point")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up applications, authority stats, and constraints
    Query {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in metres
        #[arg(long, default_value_t = 500)]
        radius: u32,
        /// Only applications received on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Only applications received on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Bypass the cache-first read; the result is still cached
        #[arg(long)]
        skip_cache: bool,
        /// Behave as if the network were unavailable
        #[arg(long)]
        offline: bool,
        /// Run without a cache store
        #[arg(long)]
        no_cache: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probe the primary planning API
    Health,
    /// Inspect or maintain the result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    Stats,
    /// Delete expired entries
    Sweep,
    /// Delete every entry
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = planscope_core::load_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query {
            lat,
            lng,
            radius,
            from,
            to,
            skip_cache,
            offline,
            no_cache,
            json,
        } => {
            let args = query::QueryArgs {
                lat,
                lng,
                radius_m: radius,
                options: planscope_core::QueryOptions {
                    from_date: from,
                    to_date: to,
                    skip_cache,
                },
                offline,
                no_cache,
                json,
            };
            query::run_query(config, args).await
        }
        Commands::Health => query::run_health(config).await,
        Commands::Cache { command } => cache::run_cache(&config, command).await,
    }
}

#[cfg(test)]
mod tests;
