use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use cmdgate::exec::{BackendFuture, CommandBackend, CommandResult, CommandRun, CommandSpec};

/// What the scripted backend does when asked to run a given executable.
#[derive(Debug, Clone)]
pub enum Step {
    /// Finish immediately with this exit code.
    Exit(i32),
    /// Behave like a missing executable: no exit code, launch error attached.
    LaunchFailure,
    /// Run for `ms`, then exit with `exit`. Exits with 143 if cancelled first.
    Sleep { ms: u64, exit: i32 },
    /// Report an orchestration fault.
    Fault(String),
    /// Panic inside the backend.
    Panic,
}

/// A backend that never spawns processes.
///
/// - records which executables were requested, in order
/// - answers from a per-executable script (unscripted executables exit 0)
pub struct ScriptedBackend {
    script: HashMap<String, Step>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on(mut self, executable: &str, step: Step) -> Self {
        self.script.insert(executable.to_string(), step);
        self
    }

    /// Shared handle to the list of executed executables.
    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBackend for ScriptedBackend {
    fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> BackendFuture<'a> {
        Box::pin(async move {
            {
                let mut guard = self.executed.lock().unwrap();
                guard.push(spec.executable.clone());
            }

            let step = self
                .script
                .get(&spec.executable)
                .cloned()
                .unwrap_or(Step::Exit(0));

            let started = std::time::Instant::now();
            let mut result = CommandResult::started(spec, Utc::now());
            result.stdout_text = spec.arguments.join(" ");

            let launch_error = match step {
                Step::Exit(code) => {
                    result.exit_code = Some(code);
                    None
                }
                Step::LaunchFailure => Some(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", spec.executable),
                )),
                Step::Sleep { ms, exit } => {
                    let code = tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(ms)) => exit,
                        _ = cancel.cancelled() => 143,
                    };
                    result.exit_code = Some(code);
                    None
                }
                Step::Fault(msg) => return Err(anyhow::anyhow!(msg)),
                Step::Panic => panic!("scripted backend panic for {}", spec.executable),
            };

            result.finished_at = Utc::now();
            result.duration = started.elapsed();
            Ok(CommandRun {
                result,
                launch_error,
            })
        })
    }
}
