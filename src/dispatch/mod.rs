// src/dispatch/mod.rs

//! Request dispatch: route matching, bearer authorization, chain execution
//! and response shaping.
//!
//! Per request the dispatcher moves through:
//!
//! 1. match `(method, path)` against the [`RouteTable`] → 404 on miss
//! 2. authorize the bearer token if the route has a key → 403 on failure
//! 3. run the route's chain through the [`ChainExecutor`]
//! 4. shape an [`ExecutionReport`] → 200
//!
//! Any orchestration fault in step 3 becomes [`DispatchError::Internal`]
//! (500). Command failures and timeouts are reported in the body, never as
//! errors.

pub mod auth;
pub mod report;
pub mod request;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::exec::{ChainExecutor, CommandRun};
use crate::sink::{FaultRecord, LogRecord, LogSink, StepRecord};

pub use auth::{authorize, extract_token};
pub use report::{CommandLog, ExecutionReport};
pub use request::InboundRequest;
pub use routes::{Route, RouteTable};

/// Terminal non-200 outcomes of a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches the request")]
    RouteNotFound,

    #[error("bearer token missing or invalid")]
    Unauthorized,

    #[error("internal fault: {0:#}")]
    Internal(anyhow::Error),
}

/// Owns the route table, the chain executor and the log sink.
///
/// Shared by all request handlers behind an `Arc`; holds no per-request
/// mutable state.
pub struct Dispatcher {
    routes: RouteTable,
    executor: ChainExecutor,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(routes: RouteTable, executor: ChainExecutor, sink: Arc<dyn LogSink>) -> Self {
        Self {
            routes,
            executor,
            sink,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn sink(&self) -> Arc<dyn LogSink> {
        Arc::clone(&self.sink)
    }

    /// Handle one request end to end, up to (not including) the HTTP response.
    pub async fn dispatch(
        &self,
        request: &InboundRequest,
    ) -> Result<ExecutionReport, DispatchError> {
        let route = self
            .routes
            .find(&request.method, &request.path)
            .ok_or(DispatchError::RouteNotFound)?;

        if !authorize(route, request) {
            debug!(
                request_id = %request.request_id,
                route = %route.label(),
                "bearer authorization failed"
            );
            return Err(DispatchError::Unauthorized);
        }

        self.execute(Arc::clone(route), &request.request_id).await
    }

    /// Run the route's chain on its own task.
    ///
    /// The chain is detached from the request future: dropping the request
    /// (client disconnect) does not cancel it, and a panic inside it is
    /// turned into an internal fault.
    async fn execute(
        &self,
        route: Arc<Route>,
        request_id: &str,
    ) -> Result<ExecutionReport, DispatchError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let executor = self.executor.clone();
        let sink = Arc::clone(&self.sink);
        let task_route = Arc::clone(&route);
        let task_request_id = request_id.to_string();

        let handle = tokio::spawn(async move {
            let label = task_route.label();
            executor
                .run(&task_route.commands, task_route.timeout, |index, run| {
                    record_step(sink.as_ref(), &task_request_id, &label, index, run);
                })
                .await
        });

        let joined = handle.await;
        let finished_at = Utc::now();
        let elapsed = clock.elapsed();

        let chain = match joined {
            Ok(Ok(chain)) => chain,
            Ok(Err(err)) => return Err(self.fault(request_id, &route, err)),
            Err(join_err) => {
                let err = anyhow::anyhow!("command chain task failed: {join_err}");
                return Err(self.fault(request_id, &route, err));
            }
        };

        Ok(ExecutionReport::new(
            &route,
            &chain,
            started_at,
            finished_at,
            elapsed,
        ))
    }

    fn fault(&self, request_id: &str, route: &Route, err: anyhow::Error) -> DispatchError {
        self.sink.write(LogRecord::Fault(FaultRecord {
            request_id: request_id.to_string(),
            route: route.label(),
            message: format!("{err:#}"),
        }));
        DispatchError::Internal(err)
    }
}

fn record_step(sink: &dyn LogSink, request_id: &str, route: &str, index: usize, run: &CommandRun) {
    let result = &run.result;

    if let Some(err) = &run.launch_error {
        sink.write(LogRecord::Fault(FaultRecord {
            request_id: request_id.to_string(),
            route: route.to_string(),
            message: format!("failed to launch '{}': {err}", result.executable),
        }));
    }

    sink.write(LogRecord::Step(StepRecord {
        request_id: request_id.to_string(),
        route: route.to_string(),
        index,
        executable: result.executable.clone(),
        arguments: result.arguments.clone(),
        working_directory: result.working_directory.display().to_string(),
        exit_code: result.exit_code,
        duration_ms: result.duration_ms(),
        stdout_text: result.stdout_text.clone(),
        stderr_text: result.stderr_text.clone(),
    }));
}
