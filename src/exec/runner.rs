// src/exec/runner.rs

//! Individual command process runner.

use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::exec::command::{CommandResult, CommandRun, CommandSpec};

/// Run one command to completion and capture its output.
///
/// - The executable is started directly with `spec.arguments` as argv; no
///   shell is involved.
/// - stdout and stderr are drained concurrently with waiting for exit and
///   buffered in full.
/// - If `cancel` fires while the process is running, it receives SIGTERM and
///   the runner keeps waiting for it to exit. It is never force-killed.
///
/// A process that cannot be launched is not an error here: the returned
/// [`CommandRun`] has `exit_code == None` and carries the launch error. `Err`
/// is reserved for failures of the host API once the process is running.
pub async fn run_command(spec: &CommandSpec, cancel: &CancellationToken) -> Result<CommandRun> {
    let started_at = Utc::now();
    let clock = Instant::now();
    let mut result = CommandResult::started(spec, started_at);

    let mut cmd = Command::new(&spec.executable);
    cmd.args(&spec.arguments)
        .current_dir(&spec.working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(
                executable = %spec.executable,
                cwd = %spec.working_directory.display(),
                error = %err,
                "failed to launch command"
            );
            result.finished_at = Utc::now();
            result.duration = clock.elapsed();
            return Ok(CommandRun {
                result,
                launch_error: Some(err),
            });
        }
    };

    debug!(
        executable = %spec.executable,
        pid = ?child.id(),
        args = ?spec.arguments,
        "command process started"
    );

    let stdout = child
        .stdout
        .take()
        .context("stdout of child process was not captured")?;
    let stderr = child
        .stderr
        .take()
        .context("stderr of child process was not captured")?;

    let (stdout_bytes, stderr_bytes, status) = tokio::join!(
        drain(stdout),
        drain(stderr),
        wait_or_terminate(&mut child, cancel, &spec.executable),
    );

    let status = status.with_context(|| format!("waiting for '{}' to exit", spec.executable))?;
    let stdout_bytes =
        stdout_bytes.with_context(|| format!("reading stdout of '{}'", spec.executable))?;
    let stderr_bytes =
        stderr_bytes.with_context(|| format!("reading stderr of '{}'", spec.executable))?;

    result.stdout_text = String::from_utf8_lossy(&stdout_bytes).into_owned();
    result.stderr_text = String::from_utf8_lossy(&stderr_bytes).into_owned();
    result.exit_code = Some(exit_code(status));
    result.finished_at = Utc::now();
    result.duration = clock.elapsed();

    debug!(
        executable = %spec.executable,
        exit_code = ?result.exit_code,
        duration_ms = result.duration_ms(),
        "command process exited"
    );

    Ok(CommandRun {
        result,
        launch_error: None,
    })
}

async fn drain<R>(mut reader: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Wait for the child, sending it a termination request if `cancel` fires first.
async fn wait_or_terminate(
    child: &mut Child,
    cancel: &CancellationToken,
    executable: &str,
) -> std::io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => status,
        _ = cancel.cancelled() => {
            info!(
                executable,
                pid = ?child.id(),
                "deadline reached; requesting command termination"
            );
            request_termination(child);
            child.wait().await
        }
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // `id()` is None once the child has been reaped.
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };

    if let Err(errno) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
        warn!(pid, error = %errno, "failed to send SIGTERM to command process");
    }
}

/// Non-unix targets have no graceful termination request; the child is
/// killed outright.
#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to terminate command process");
    }
}

/// Exit code of a finished process; signal deaths map to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
