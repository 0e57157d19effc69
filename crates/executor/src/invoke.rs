//! Subprocess invocation: spawns the external agent, bounds it with a
//! timeout, and reacts to cooperative cancellation without ever holding two
//! concurrent mutable borrows of the child across the wait.

use std::process::Stdio;
use std::time::Duration;

use rex_core::{scrub_output, ExecutionState};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// The outcome of one agent invocation, ready to become an `ExecutionRecord`.
pub struct ExecutionOutcome {
    pub state: ExecutionState,
    pub output: String,
    pub error: Option<String>,
}

/// Spawns `agent_path argv..` (through `sudo -u <user>` when `run_as_user`
/// is set), bounding it by `timeout`. The child is driven to completion on
/// a detached task so that the cancellation and timeout races never need to
/// borrow it concurrently with the wait future; on cancellation or timeout
/// the child's pid is sent a `SIGKILL` directly.
pub async fn invoke(
    agent_path: &str,
    run_as_user: Option<&str>,
    argv: &[String],
    cwd: Option<&str>,
    env_vars: &std::collections::HashMap<String, String>,
    timeout: Duration,
    cancel: CancellationToken,
) -> ExecutionOutcome {
    let mut command = match run_as_user {
        Some(user) => {
            let mut c = Command::new("sudo");
            c.arg("-u").arg(user).arg(agent_path);
            c
        }
        None => Command::new(agent_path),
    };
    command.args(argv);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.envs(env_vars);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ExecutionOutcome {
                state: ExecutionState::Failure,
                output: String::new(),
                error: Some(format!("failed to spawn agent process: {e}")),
            };
        }
    };
    let pid = child.id();

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = child.wait_with_output().await;
        let _ = tx.send(result);
    });

    tokio::select! {
        _ = cancel.cancelled() => {
            kill_pid(pid);
            ExecutionOutcome { state: ExecutionState::Cancelled, output: String::new(), error: Some("execution cancelled".to_string()) }
        }
        _ = tokio::time::sleep(timeout) => {
            kill_pid(pid);
            ExecutionOutcome {
                state: ExecutionState::Timeout,
                output: String::new(),
                error: Some(format!("agent process exceeded timeout of {}s", timeout.as_secs())),
            }
        }
        result = rx => classify(result)
    }
}

fn classify(result: Result<std::io::Result<std::process::Output>, oneshot::error::RecvError>) -> ExecutionOutcome {
    match result {
        Ok(Ok(output)) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            let combined = scrub_output(&combined);
            if output.status.success() {
                ExecutionOutcome { state: ExecutionState::Success, output: combined, error: None }
            } else {
                let code = output.status.code();
                ExecutionOutcome {
                    state: ExecutionState::Failure,
                    output: combined,
                    error: Some(match code {
                        Some(code) => format!("agent process exited with status {code}"),
                        None => "agent process terminated by signal".to_string(),
                    }),
                }
            }
        }
        Ok(Err(e)) => {
            ExecutionOutcome { state: ExecutionState::Failure, output: String::new(), error: Some(format!("failed to collect agent output: {e}")) }
        }
        Err(_) => {
            ExecutionOutcome { state: ExecutionState::Failure, output: String::new(), error: Some("agent task terminated unexpectedly".to_string()) }
        }
    }
}

fn kill_pid(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), nix::sys::signal::Signal::SIGKILL);
}

#[cfg(test)]
#[path = "invoke_tests.rs"]
mod tests;
