// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands configured
//! for a route, using `tokio::process::Command`, and aggregating the results.
//!
//! - [`command`] holds the data types: what to run and what happened.
//! - [`runner`] runs one process, capturing output, with cooperative
//!   cancellation.
//! - [`chain`] runs a whole chain sequentially under a single deadline.
//! - [`backend`] provides the `CommandBackend` trait and the concrete
//!   `ProcessBackend` used in production, which tests can replace with a
//!   scripted implementation.

pub mod backend;
pub mod chain;
pub mod command;
pub mod runner;

pub use backend::{BackendFuture, CommandBackend, ProcessBackend};
pub use chain::{ChainExecutor, ChainResult};
pub use command::{CommandResult, CommandRun, CommandSpec};
pub use runner::run_command;
