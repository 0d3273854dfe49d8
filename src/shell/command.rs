//! Async shell command execution.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{PipegraphError, Result};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Stdout and stderr joined, for attaching to failures.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }

    /// Turn a non-zero exit into [`PipegraphError::CommandFailed`].
    pub fn into_result(self, command: &str) -> Result<CommandResult> {
        if self.success {
            Ok(self)
        } else {
            let output = self.combined_output();
            Err(PipegraphError::CommandFailed {
                command: command.to_string(),
                code: self.exit_code,
                output: (!output.is_empty()).then_some(output),
            })
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Timeout (None = no timeout).
    pub timeout: Option<Duration>,
}

/// Execute a shell command, killing it if `cancel` fires or the timeout
/// elapses.
pub async fn execute(
    command: &str,
    options: &CommandOptions,
    cancel: &CancellationToken,
) -> Result<CommandResult> {
    let start = Instant::now();
    let shell = detect_shell();

    let mut cmd = Command::new(&shell);
    cmd.arg(shell_flag()).arg(command);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.envs(&options.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(shell = %shell, "executing: {}", command);
    let mut child = cmd.spawn()?;
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(read_pipe(stdout_pipe));
    let stderr_task = tokio::spawn(read_pipe(stderr_pipe));

    let timeout = options.timeout.unwrap_or(Duration::MAX);
    let status = tokio::select! {
        waited = tokio::time::timeout(timeout, child.wait()) => match waited {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(PipegraphError::CommandFailed {
                    command: command.to_string(),
                    code: None,
                    output: Some(format!("timed out after {}s", timeout.as_secs())),
                });
            }
        },
        _ = cancel.cancelled() => {
            let _ = child.kill().await;
            return Err(PipegraphError::Cancelled);
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(CommandResult {
        exit_code: status.code(),
        stdout,
        stderr,
        duration: start.elapsed(),
        success: status.success(),
    })
}

/// Execute a command and report whether it exited zero.
pub async fn execute_check(command: &str, options: &CommandOptions) -> Result<bool> {
    let result = execute(command, options, &CancellationToken::new()).await?;
    Ok(result.success)
}

async fn read_pipe(pipe: Option<impl tokio::io::AsyncRead + Unpin>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Get the shell executable to use.
fn detect_shell() -> String {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        "/bin/sh".to_string()
    }
}

/// Get the flag to pass commands to the shell.
fn shell_flag() -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-c"
    }
}
