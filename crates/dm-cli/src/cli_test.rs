use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    Cli::command().debug_assert();
}

#[test]
fn test_apply_flags() {
    let cli = Cli::try_parse_from([
        "dm",
        "apply",
        "--database",
        "oracle",
        "--delta-storage-location",
        "file:///srv/deltas",
        "--branch",
        "release",
        "--last-delta",
        "10",
        "--target-delta",
        "13",
        "--execute",
        "dev.duckdb",
        "-o",
        "json",
    ])
    .unwrap();

    let Commands::Apply(args) = cli.command else {
        panic!("expected apply");
    };
    assert_eq!(args.target.database, Some(DatabaseArg::Oracle));
    assert_eq!(
        args.target.delta_storage_location.as_deref(),
        Some("file:///srv/deltas")
    );
    assert_eq!(args.target.branch.unwrap(), "release");
    assert_eq!(args.bounds.last_delta, Some(DeltaId::Number(10)));
    assert_eq!(args.bounds.target_delta, Some(DeltaId::Number(13)));
    assert_eq!(args.execute.as_deref(), Some("dev.duckdb"));
    assert_eq!(args.output, OutputFormat::Json);
}

#[test]
fn test_bounds_are_optional() {
    let cli = Cli::try_parse_from(["dm", "plan"]).unwrap();
    let Commands::Plan(args) = cli.command else {
        panic!("expected plan");
    };
    assert!(args.bounds.last_delta.is_none());
    assert!(args.bounds.target_delta.is_none());
    assert_eq!(args.output, OutputFormat::Text);
}

#[test]
fn test_invalid_delta_id_is_rejected() {
    let err = Cli::try_parse_from(["dm", "apply", "--target-delta", "12 13"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["dm", "status", "-v", "-p", "/work/app"]).unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.project_dir, "/work/app");
}

#[test]
fn test_engine_mapping() {
    assert_eq!(DatabaseEngine::from(DatabaseArg::Mysql), DatabaseEngine::MySql);
    assert_eq!(StorageEngine::from(StorageArg::Local), StorageEngine::Local);
}
