//! External command execution.

use crate::error::{JobError, JobResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of running a command to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock execution time.
    pub duration: Duration,
}

impl ExecutionOutput {
    /// Builds an output with just an exit code, mostly for tests.
    pub fn with_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code: Some(exit_code),
            ..Self::default()
        }
    }

    /// Returns true if the process exited with status 0.
    pub fn exited_successfully(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs job command lines.
///
/// Implementations block (asynchronously) until the command finishes or the
/// timeout elapses. Timeouts and launch errors are reported as `Err`.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute `command` with the given timeout.
    async fn execute(&self, command: &str, timeout: Duration) -> JobResult<ExecutionOutput>;
}

/// Executes commands through a shell (`<shell> -c <command>`).
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    /// Create an executor using the given shell binary.
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str, timeout: Duration) -> JobResult<ExecutionOutput> {
        let started = Instant::now();

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(command.trim())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| JobError::Launch(format!("{}: {}", self.shell, e)))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(JobError::ExecutionFailed(e.to_string())),
            Err(_) => {
                warn!(command, timeout = ?timeout, "Command timed out");
                return Err(JobError::Timeout(timeout));
            }
        };

        let result = ExecutionOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: started.elapsed(),
        };

        debug!(
            command,
            exit_code = ?result.exit_code,
            stdout_len = result.stdout.len(),
            duration_ms = result.duration.as_millis() as u64,
            "Command finished"
        );

        Ok(result)
    }
}
