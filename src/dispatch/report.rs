// src/dispatch/report.rs

//! JSON body returned for a successfully dispatched request.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::dispatch::routes::Route;
use crate::exec::{ChainResult, CommandResult};

/// Response body for a `200`.
///
/// `duration_ms` is measured around the whole dispatch of the chain, not
/// summed from the steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: u64,
    /// Configured chain length, executed or not.
    pub total_commands: usize,
    pub success_count: usize,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_logs: Option<Vec<CommandLog>>,
}

/// Per-step detail attached when the route has `include_logs = true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLog {
    pub working_directory: String,
    pub executable: String,
    pub arguments: Vec<String>,
    pub stdout_text: String,
    pub stderr_text: String,
    pub duration_ms: u64,
}

impl From<&CommandResult> for CommandLog {
    fn from(r: &CommandResult) -> Self {
        Self {
            working_directory: r.working_directory.display().to_string(),
            executable: r.executable.clone(),
            arguments: r.arguments.clone(),
            stdout_text: r.stdout_text.clone(),
            stderr_text: r.stderr_text.clone(),
            duration_ms: r.duration_ms(),
        }
    }
}

impl ExecutionReport {
    pub fn new(
        route: &Route,
        chain: &ChainResult,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let command_logs = route
            .include_logs
            .then(|| chain.results.iter().map(CommandLog::from).collect());

        Self {
            started_at: iso_timestamp(started_at),
            finished_at: iso_timestamp(finished_at),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            total_commands: route.commands.len(),
            success_count: chain.success_count(),
            timed_out: chain.timed_out,
            command_logs,
        }
    }
}

/// `2024-01-02T03:04:05.678Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
