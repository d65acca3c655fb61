//! Subprocess execution for the VPN control program.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::egress::EgressError;

/// Output from a process execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output content.
    pub stdout: String,
    /// Standard error content.
    pub stderr: String,
    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,
    /// How long the command took to execute.
    pub duration: Duration,
}

impl ProcessOutput {
    /// Builds an output by hand, mostly useful for fake egress commands.
    pub fn new(exit_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code,
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Short description of a failed run for logs and errors.
    pub fn describe_failure(&self) -> String {
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        format!("exit code {}: {}", self.exit_code, detail)
    }
}

/// Runs external commands and captures their output.
///
/// Children are killed when the returned future is dropped, so wrapping a
/// call in `tokio::time::timeout` bounds it for real.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a command and capture output.
    #[instrument(skip(self, args), fields(cmd = %cmd))]
    pub async fn run(&self, cmd: &str, args: &[String]) -> Result<ProcessOutput, EgressError> {
        debug!(args = ?args, "Running command");
        let start = Instant::now();

        let output = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    warn!(cmd = %cmd, "Command not found");
                    EgressError::NotFound(cmd.to_string())
                } else {
                    EgressError::Io(e)
                }
            })?;

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        };

        debug!(
            exit_code = result.exit_code,
            duration = ?result.duration,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "Command completed"
        );

        Ok(result)
    }
}
