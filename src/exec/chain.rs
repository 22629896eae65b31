// src/exec/chain.rs

//! Sequential, deadline-bounded execution of a command chain.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::exec::backend::CommandBackend;
use crate::exec::command::{CommandResult, CommandRun, CommandSpec};

/// Aggregate outcome of one chain run.
///
/// `results` is a prefix of the configured chain: it stops at the first
/// step that did not exit with 0, or at the step during which the deadline
/// fired.
#[derive(Debug, Clone)]
pub struct ChainResult {
    pub results: Vec<CommandResult>,
    pub timed_out: bool,
}

impl ChainResult {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }
}

/// Runs command chains through a [`CommandBackend`].
///
/// Cheap to clone; holds no per-run state.
#[derive(Clone)]
pub struct ChainExecutor {
    backend: Arc<dyn CommandBackend>,
}

impl std::fmt::Debug for ChainExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainExecutor").finish_non_exhaustive()
    }
}

impl ChainExecutor {
    pub fn new(backend: Arc<dyn CommandBackend>) -> Self {
        Self { backend }
    }

    /// Run `chain` in order under a single `timeout` for the whole chain.
    ///
    /// - The deadline is checked before each step; once it has fired no
    ///   further step is started.
    /// - The same cancellation token is handed to every step, so a step that
    ///   is running when the deadline fires is asked to terminate.
    /// - The chain stops after the first step whose exit code is not 0
    ///   (including steps that could not be launched).
    /// - `on_step` is called synchronously after every executed step, with
    ///   the step index.
    ///
    /// `Err` is only returned when the backend reports an orchestration
    /// fault; command failures are data in the [`ChainResult`].
    pub async fn run<F>(
        &self,
        chain: &[CommandSpec],
        timeout: Duration,
        mut on_step: F,
    ) -> Result<ChainResult>
    where
        F: FnMut(usize, &CommandRun) + Send,
    {
        let deadline = CancellationToken::new();
        let timer = spawn_deadline(deadline.clone(), timeout);

        let outcome = self.run_steps(chain, &deadline, &mut on_step).await;

        // Clear the timer on every exit path.
        timer.abort();
        let results = outcome?;
        let timed_out = deadline.is_cancelled();

        debug!(
            executed = results.len(),
            configured = chain.len(),
            timed_out,
            "command chain finished"
        );

        Ok(ChainResult { results, timed_out })
    }

    async fn run_steps<F>(
        &self,
        chain: &[CommandSpec],
        deadline: &CancellationToken,
        on_step: &mut F,
    ) -> Result<Vec<CommandResult>>
    where
        F: FnMut(usize, &CommandRun) + Send,
    {
        let mut results = Vec::with_capacity(chain.len());

        for (index, spec) in chain.iter().enumerate() {
            if deadline.is_cancelled() {
                info!(step = index, "chain deadline already reached; not starting step");
                break;
            }

            let run = self.backend.run(spec, deadline).await?;
            on_step(index, &run);

            let succeeded = run.result.succeeded();
            let exit_code = run.result.exit_code;
            results.push(run.result);

            if !succeeded {
                info!(
                    step = index,
                    executable = %spec.executable,
                    exit_code = ?exit_code,
                    "command did not succeed; stopping chain"
                );
                break;
            }

            if deadline.is_cancelled() {
                info!(step = index, "chain deadline reached; stopping chain");
                break;
            }
        }

        Ok(results)
    }
}

fn spawn_deadline(token: CancellationToken, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        token.cancel();
    })
}
