// tests/cli_and_logging.rs

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use cmdgate::cli::{CliArgs, LogLevel};
use cmdgate::logging::resolve_level;

#[test]
fn test_cli_flag_wins_over_env_and_config() {
    let level = resolve_level(Some(LogLevel::Trace), Some("error"), Some("warn"));
    assert_eq!(level, Level::TRACE);
}

#[test]
fn test_env_wins_over_config() {
    assert_eq!(resolve_level(None, Some("debug"), Some("warn")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some(" WARNING "), None), Level::WARN);
}

#[test]
fn test_unparseable_levels_fall_through() {
    assert_eq!(resolve_level(None, Some("loud"), Some("error")), Level::ERROR);
    assert_eq!(resolve_level(None, Some("loud"), Some("quiet")), Level::INFO);
    assert_eq!(resolve_level(None, None, None), Level::INFO);
}

#[test]
fn test_cli_parses_overrides() {
    let args = CliArgs::try_parse_from([
        "cmdgate",
        "--config",
        "/etc/cmdgate.toml",
        "--log-level",
        "debug",
        "--port",
        "9000",
        "--host",
        "0.0.0.0",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(args.config_path(), PathBuf::from("/etc/cmdgate.toml"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert_eq!(args.port, Some(9000));
    assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
    assert!(args.dry_run);
}

#[test]
fn test_cli_rejects_unknown_level() {
    assert!(CliArgs::try_parse_from(["cmdgate", "--log-level", "loud"]).is_err());
}
