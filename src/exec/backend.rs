// src/exec/backend.rs

//! Pluggable command backend abstraction.
//!
//! The chain executor talks to a `CommandBackend` instead of spawning
//! processes itself. This makes it easy to swap in a scripted backend in
//! tests while keeping the production implementation in [`runner`].
//!
//! - `ProcessBackend` is the default implementation used by `cmdgate`. It
//!   forwards to [`run_command`], which starts a real OS process.
//! - Tests can provide their own `CommandBackend` that, for example, records
//!   which commands were requested and returns canned exit codes.
//!
//! [`runner`]: crate::exec::runner

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::exec::command::{CommandRun, CommandSpec};
use crate::exec::runner::run_command;

/// Boxed future returned by [`CommandBackend::run`].
pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<CommandRun>> + Send + 'a>>;

/// Trait abstracting how a single command is executed.
///
/// Production code uses [`ProcessBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait CommandBackend: Send + Sync {
    /// Execute `spec`, honouring `cancel` as a termination request.
    ///
    /// Command-level failures (non-zero exit, launch failure) are reported
    /// inside the returned [`CommandRun`]. `Err` means the orchestration
    /// itself broke.
    fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> BackendFuture<'a>;
}

/// Real backend used in production: one OS process per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessBackend;

impl CommandBackend for ProcessBackend {
    fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> BackendFuture<'a> {
        Box::pin(run_command(spec, cancel))
    }
}
