// src/sink.rs

//! Structured log sink handed to the dispatcher.
//!
//! The dispatcher never reaches for a global logger; it writes
//! [`LogRecord`]s to whatever [`LogSink`] it was constructed with. In
//! production that is [`TracingSink`], which turns each record into a
//! `tracing` event so it ends up wherever `logging::init_logging` routed
//! output (stderr or a rotating file).

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

/// A flat key-value record.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    /// One per request, after the response is built.
    Access(AccessRecord),
    /// One per executed command step.
    Step(StepRecord),
    /// Launch failures and internal faults.
    Fault(FaultRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessRecord {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub request_id: String,
    pub route: String,
    pub index: usize,
    pub executable: String,
    pub arguments: Vec<String>,
    pub working_directory: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub stdout_text: String,
    pub stderr_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaultRecord {
    pub request_id: String,
    pub route: String,
    pub message: String,
}

/// Destination for [`LogRecord`]s. Must be cheap and non-blocking.
pub trait LogSink: Send + Sync {
    fn write(&self, record: LogRecord);
}

/// Forwards records to `tracing`.
///
/// Access records for 5xx statuses and all fault records are emitted at
/// `ERROR`; step records at `DEBUG`; everything else at `INFO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: LogRecord) {
        match record {
            LogRecord::Access(r) => {
                let started_at = r.started_at.to_rfc3339();
                if r.status >= 500 {
                    error!(
                        target: "cmdgate::access",
                        request_id = %r.request_id,
                        method = %r.method,
                        path = %r.path,
                        status = r.status,
                        started_at = %started_at,
                        elapsed_ms = r.elapsed_ms,
                        "request completed"
                    );
                } else {
                    info!(
                        target: "cmdgate::access",
                        request_id = %r.request_id,
                        method = %r.method,
                        path = %r.path,
                        status = r.status,
                        started_at = %started_at,
                        elapsed_ms = r.elapsed_ms,
                        "request completed"
                    );
                }
            }
            LogRecord::Step(r) => {
                debug!(
                    target: "cmdgate::step",
                    request_id = %r.request_id,
                    route = %r.route,
                    index = r.index,
                    executable = %r.executable,
                    arguments = ?r.arguments,
                    working_directory = %r.working_directory,
                    exit_code = ?r.exit_code,
                    duration_ms = r.duration_ms,
                    stdout = %r.stdout_text,
                    stderr = %r.stderr_text,
                    "command step finished"
                );
            }
            LogRecord::Fault(r) => {
                error!(
                    target: "cmdgate::fault",
                    request_id = %r.request_id,
                    route = %r.route,
                    error = %r.message,
                    "request fault"
                );
            }
        }
    }
}
