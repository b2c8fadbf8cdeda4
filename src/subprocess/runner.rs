use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;

use super::error::ProcessError;
use super::output::OutputSink;

/// Exit code reported when the command could not be started at all.
pub const START_FAILURE_EXIT_CODE: i32 = -1;

/// Exit code reported when the command was killed after its timeout elapsed.
pub const TIMEOUT_EXIT_CODE: i32 = -2;

/// A single command line plus the text to feed on its standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub input: String,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            input: input.into(),
            timeout: None,
        }
    }
}

/// Outcome of one invocation. `exit_code == 0` means success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn is_start_failure(&self) -> bool {
        self.exit_code == START_FAILURE_EXIT_CODE
    }

    pub fn is_timeout(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE
    }

    /// Result for a process that never ran
    pub fn start_failure(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: START_FAILURE_EXIT_CODE,
        }
    }

    /// Result for a process that was killed after `timeout`
    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("process killed after exceeding timeout of {timeout:?}"),
            exit_code: TIMEOUT_EXIT_CODE,
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` to completion. Failures are reported through
    /// [`ExecutionResult::exit_code`], never as an error.
    async fn run(&self, invocation: Invocation) -> ExecutionResult;
}

/// Runs commands through the platform shell on the tokio runtime.
pub struct TokioProcessRunner {
    output: Arc<dyn OutputSink>,
}

impl TokioProcessRunner {
    pub fn new(output: Arc<dyn OutputSink>) -> Self {
        Self { output }
    }

    #[cfg(unix)]
    fn shell_command(command_line: &str) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }

    #[cfg(not(unix))]
    fn shell_command(command_line: &str) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    }

    /// Shell statuses meaning the command itself could not be started
    #[cfg(unix)]
    fn is_shell_start_failure(code: i32) -> bool {
        // POSIX: 126 = found but not executable, 127 = not found
        code == 126 || code == 127
    }

    #[cfg(not(unix))]
    fn is_shell_start_failure(code: i32) -> bool {
        // cmd.exe: "is not recognized as an internal or external command"
        code == 9009
    }

    fn configure_command(invocation: &Invocation) -> tokio::process::Command {
        let mut cmd = Self::shell_command(&invocation.command);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn map_spawn_error(error: std::io::Error, command: &str) -> ProcessError {
        match error.kind() {
            std::io::ErrorKind::NotFound => ProcessError::CommandNotFound(command.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                ProcessError::PermissionDenied(command.to_string())
            }
            _ => ProcessError::SpawnFailed {
                command: command.to_string(),
                source: error,
            },
        }
    }

    /// Write all of `input` then close the pipe. A child that exits without
    /// reading its input is not an error.
    async fn write_stdin(stdin: Option<ChildStdin>, input: &str) -> Result<(), ProcessError> {
        let Some(mut stdin) = stdin else {
            return Ok(());
        };

        if !input.is_empty() {
            match stdin.write_all(input.as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::trace!("Child closed stdin before reading all input");
                    return Ok(());
                }
                Err(e) => return Err(ProcessError::Io(e)),
            }
        }

        match stdin.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            Err(e) => Err(ProcessError::Io(e)),
        }
    }

    /// Feed stdin while waiting for exit and draining both output streams.
    ///
    /// The timeout covers the writer as well as the wait. On expiry both the
    /// child and its stdin are dropped, which kills the child and unblocks a
    /// writer stuck on a pipe some descendant still holds open.
    async fn execute(&self, invocation: &Invocation) -> Result<std::process::Output, ProcessError> {
        let mut cmd = Self::configure_command(invocation);
        let mut child = cmd.spawn().map_err(|e| {
            tracing::debug!("Failed to spawn shell: {:?} (kind: {:?})", e, e.kind());
            Self::map_spawn_error(e, &invocation.command)
        })?;

        let stdin = child.stdin.take();
        let command = &invocation.command;
        let input = &invocation.input;
        let run = async move {
            let (written, output) =
                tokio::join!(Self::write_stdin(stdin, input), child.wait_with_output());

            if let Err(e) = written {
                tracing::warn!("Failed to write stdin for `{}`: {}", command, e);
            }
            output.map_err(ProcessError::Io)
        };

        match invocation.timeout {
            Some(duration) => tokio::time::timeout(duration, run)
                .await
                .map_err(|_| ProcessError::Timeout(duration))?,
            None => run.await,
        }
    }

    fn exit_code(status: std::process::ExitStatus) -> i32 {
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

        1
    }

    fn build_result(output: std::process::Output) -> ExecutionResult {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = Self::exit_code(output.status);

        if Self::is_shell_start_failure(exit_code) {
            let reason = if stderr.trim().is_empty() {
                format!("shell could not start the command (status {exit_code})")
            } else {
                stderr.trim_end().to_string()
            };
            return ExecutionResult::start_failure(reason);
        }

        ExecutionResult {
            stdout,
            stderr,
            exit_code,
        }
    }

    fn log_start(&self, invocation: &Invocation) {
        self.output
            .append_line(&format!("Running: {}", invocation.command));

        tracing::debug!("Executing subprocess: {}", invocation.command);
        tracing::trace!("Stdin provided: {} bytes", invocation.input.len());
        if let Some(timeout) = invocation.timeout {
            tracing::trace!("Timeout: {:?}", timeout);
        }
    }

    fn log_result(&self, command: &str, result: &ExecutionResult, duration: Duration) {
        if result.is_start_failure() {
            self.output
                .append_line(&format!("Failed to start `{}`: {}", command, result.stderr));
            tracing::warn!("Subprocess could not be started: {}", command);
            return;
        }

        if result.is_timeout() {
            self.output
                .append_line(&format!("Timed out: {}", result.stderr));
            tracing::warn!("Subprocess timed out after {:?}: {}", duration, command);
            return;
        }

        if !result.stderr.trim().is_empty() {
            self.output
                .append_line(&format!("stderr: {}", result.stderr.trim_end()));
        }
        self.output
            .append_line(&format!("Exited with code {}", result.exit_code));

        tracing::debug!(
            "Subprocess exited with code {} in {:?}: {}",
            result.exit_code,
            duration,
            command
        );
        tracing::trace!("Stdout length: {} bytes", result.stdout.len());
        tracing::trace!("Stderr length: {} bytes", result.stderr.len());
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: Invocation) -> ExecutionResult {
        let start = Instant::now();
        self.log_start(&invocation);

        let result = match self.execute(&invocation).await {
            Ok(output) => Self::build_result(output),
            Err(ProcessError::Timeout(duration)) => ExecutionResult::timed_out(duration),
            Err(e) => ExecutionResult::start_failure(e.to_string()),
        };

        self.log_result(&invocation.command, &result, start.elapsed());
        result
    }
}
