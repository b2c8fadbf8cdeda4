use thiserror::Error;

pub mod codes;

pub use codes::{describe_exit_code, ExitCode};

/// Why a transform batch stopped
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("No active text editor")]
    NoEditorActive,

    #[error("Failed to run command: {command}")]
    ProcessStartFailure { command: String, reason: String },

    #[error("Command `{command}` exited with code {code}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Command `{command}` timed out")]
    TimedOut { command: String, detail: String },

    #[error("Temporary file error: {message}")]
    Filesystem {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to apply edit: {0}")]
    Edit(String),
}

impl TransformError {
    pub fn filesystem(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            message: message.into(),
            source,
        }
    }

    /// Text shown to the user in a notification.
    ///
    /// Start failures only name the command; the underlying reason goes to the
    /// output channel instead.
    pub fn user_message(&self) -> String {
        match self {
            Self::NonZeroExit {
                command,
                code,
                stderr,
            } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("Command `{}` failed with exit code {}", command, code)
                } else {
                    format!("Command `{}` failed: {}", command, stderr)
                }
            }
            Self::TimedOut { command, detail } => {
                format!("Command `{}` timed out: {}", command, detail)
            }
            Self::Filesystem { message, source } => {
                format!("Temporary file error: {}: {}", message, source)
            }
            other => other.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoEditorActive => ExitCode::NO_DOCUMENT,
            Self::ProcessStartFailure { .. } => ExitCode::START_FAILURE,
            Self::NonZeroExit { .. } => ExitCode::NON_ZERO_EXIT,
            Self::TimedOut { .. } => ExitCode::TIMEOUT,
            Self::Filesystem { .. } => ExitCode::FILESYSTEM,
            Self::Edit(_) => ExitCode::EDIT_FAILED,
        }
    }
}
