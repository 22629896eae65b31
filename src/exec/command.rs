// src/exec/command.rs

//! Command data: what to run ([`CommandSpec`]) and what happened ([`CommandResult`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{normalize_args, CommandConfig};

/// One external process to run: executable, argv and working directory.
///
/// Built once at startup and shared read-only by every request hitting the
/// owning route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub working_directory: PathBuf,
    pub executable: String,
    pub arguments: Vec<String>,
}

impl CommandSpec {
    pub fn new(
        executable: impl Into<String>,
        arguments: Vec<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            working_directory: working_directory.into(),
            executable: executable.into(),
            arguments,
        }
    }

    /// Build a spec from a `[[route.command]]` entry.
    ///
    /// `default_cwd` is used when the entry has no `cwd`.
    pub fn from_config(cfg: &CommandConfig, default_cwd: &Path) -> Self {
        let working_directory = cfg
            .cwd
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_cwd.to_path_buf());

        Self {
            working_directory,
            executable: cfg.command.clone(),
            arguments: normalize_args(cfg.args.as_ref()),
        }
    }
}

/// Outcome of running one [`CommandSpec`].
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub working_directory: PathBuf,
    pub executable: String,
    pub arguments: Vec<String>,
    pub stdout_text: String,
    pub stderr_text: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
    /// `None` when the process never started.
    pub exit_code: Option<i32>,
}

impl CommandResult {
    /// Result skeleton echoing `spec`, with empty output and no exit code.
    pub fn started(spec: &CommandSpec, started_at: DateTime<Utc>) -> Self {
        Self {
            working_directory: spec.working_directory.clone(),
            executable: spec.executable.clone(),
            arguments: spec.arguments.clone(),
            stdout_text: String::new(),
            stderr_text: String::new(),
            started_at,
            finished_at: started_at,
            duration: Duration::ZERO,
            exit_code: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// What a backend hands back for one step.
///
/// `launch_error` is set when the OS refused to start the process; the
/// result then has `exit_code == None`. Callers record the result and may
/// log the error, but the step is not an orchestration failure.
#[derive(Debug)]
pub struct CommandRun {
    pub result: CommandResult,
    pub launch_error: Option<std::io::Error>,
}
