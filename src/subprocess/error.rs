use std::time::Duration;

/// Failures that can occur while driving a child process.
///
/// These never leave the runner: `TokioProcessRunner::run` folds each of them
/// into an [`ExecutionResult`](super::ExecutionResult) with a sentinel exit code.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Whether the process never got far enough to run the command.
    pub fn is_start_failure(&self) -> bool {
        matches!(
            self,
            ProcessError::CommandNotFound(_)
                | ProcessError::PermissionDenied(_)
                | ProcessError::SpawnFailed { .. }
        )
    }
}
