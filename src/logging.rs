// src/logging.rs

//! Logging setup for `cmdgate` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CMDGATE_LOG` environment variable (e.g. "info", "debug")
//! 3. `[logging].level` from the config file
//! 4. default to `info`
//!
//! Logs go to STDERR, or to `[logging].file` through a rolling appender.
//! Command output is never written to stdout by the gateway.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::cli::LogLevel;
use crate::config::LoggingSection;
use crate::types::{LogFormat, LogRotation};

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "CMDGATE_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup. When logging to a file, the returned guard
/// must be kept alive for the lifetime of the process so buffered lines are
/// flushed.
pub fn init_logging(
    cli_level: Option<LogLevel>,
    section: &LoggingSection,
) -> Result<Option<WorkerGuard>> {
    let level = resolve_level(
        cli_level,
        std::env::var(LOG_ENV).ok().as_deref(),
        section.level.as_deref(),
    );

    let (writer, guard) = match section.file.as_deref() {
        Some(path) => {
            let appender = file_appender(Path::new(path), section.rotation)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer);

    let installed = match section.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| anyhow!("installing log subscriber: {e}"))?;

    Ok(guard)
}

/// Apply the level priority; unparseable values fall through to the next source.
pub fn resolve_level(
    cli_level: Option<LogLevel>,
    env_level: Option<&str>,
    config_level: Option<&str>,
) -> tracing::Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    env_level
        .and_then(parse_level_str)
        .or_else(|| config_level.and_then(parse_level_str))
        .unwrap_or(tracing::Level::INFO)
}

fn file_appender(path: &Path, rotation: LogRotation) -> Result<RollingFileAppender> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("log file path '{}' has no file name", path.display()))?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory '{}'", dir.display()))?;

    RollingFileAppender::builder()
        .rotation(rotation_of(rotation))
        .filename_prefix(prefix)
        .build(dir)
        .with_context(|| format!("opening log file '{}'", path.display()))
}

fn rotation_of(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
