use super::*;

#[test]
fn parses_query_with_defaults() {
    let cli = Cli::try_parse_from(["planscope", "query", "--lat", "51.5074", "--lng", "-0.1278"])
        .expect("expected valid cli args");

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
            assert!((lat - 51.5074).abs() < f64::EPSILON);
            assert!((lng + 0.1278).abs() < f64::EPSILON);
            assert_eq!(radius, 500);
            assert!(from.is_none() && to.is_none());
            assert!(!skip_cache && !offline && !no_cache && !json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_query_with_dates_and_flags() {
    let cli = Cli::try_parse_from([
        "planscope",
        "query",
        "--lat",
        "51.5",
        "--lng",
        "-0.12",
        "--radius",
        "1000",
        "--from",
        "2024-01-01",
        "--to",
        "2024-06-30",
        "--skip-cache",
        "--offline",
        "--json",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Query {
            radius,
            from,
            to,
            skip_cache,
            offline,
            no_cache,
            json,
            ..
        } => {
            assert_eq!(radius, 1000);
            assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1));
            assert_eq!(to, NaiveDate::from_ymd_opt(2024, 6, 30));
            assert!(skip_cache && offline && json);
            assert!(!no_cache);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn rejects_malformed_date() {
    let result = Cli::try_parse_from([
        "planscope", "query", "--lat", "51.5", "--lng", "-0.12", "--from", "01/01/2024",
    ]);
    assert!(result.is_err());
}

#[test]
fn query_requires_coordinates() {
    assert!(Cli::try_parse_from(["planscope", "query", "--lat", "51.5"]).is_err());
}

#[test]
fn parses_health_command() {
    let cli = Cli::try_parse_from(["planscope", "health"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Health));
}

#[test]
fn parses_cache_subcommands() {
    let cli = Cli::try_parse_from(["planscope", "cache", "stats"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Cache {
            command: CacheCommands::Stats
        }
    ));

    let cli = Cli::try_parse_from(["planscope", "cache", "sweep"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Cache {
            command: CacheCommands::Sweep
        }
    ));

    let cli = Cli::try_parse_from(["planscope", "cache", "clear"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Cache {
            command: CacheCommands::Clear
        }
    ));
}

#[test]
fn help_parses_before_any_configuration_is_read() {
    let err = Cli::try_parse_from(["planscope", "--help"]).expect_err("help exits early");
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}
