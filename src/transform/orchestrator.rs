use std::sync::Arc;

use super::host::{EditorHost, Selection};
use super::vault::{vault_invocation, VaultAction, VaultFile};
use crate::config::TransformSettings;
use crate::error::TransformError;
use crate::subprocess::{ExecutionResult, InvocationBuilder, OutputSink, ProcessRunner};

/// Which transform a batch applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Command,
    VaultEncrypt,
    VaultDecrypt,
}

impl TransformKind {
    fn vault_action(&self) -> Option<VaultAction> {
        match self {
            TransformKind::Command => None,
            TransformKind::VaultEncrypt => Some(VaultAction::Encrypt),
            TransformKind::VaultDecrypt => Some(VaultAction::Decrypt),
        }
    }
}

/// Summary of a batch that ran to completion.
///
/// A failed batch returns the error instead; the host knows how many of its
/// selections were replaced before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Selections transformed, which is every selection the host offered
    pub total: usize,
}

/// Applies transforms to every selection of a host, one process at a time.
///
/// A batch stops at the first failing selection. Selections already replaced
/// stay replaced, and the failure is reported to the host exactly once.
pub struct TransformOrchestrator {
    runner: Arc<dyn ProcessRunner>,
    output: Arc<dyn OutputSink>,
    settings: TransformSettings,
}

impl TransformOrchestrator {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        output: Arc<dyn OutputSink>,
        settings: TransformSettings,
    ) -> Self {
        Self {
            runner,
            output,
            settings,
        }
    }

    pub fn settings(&self) -> &TransformSettings {
        &self.settings
    }

    pub async fn run_command(
        &self,
        host: &mut dyn EditorHost,
    ) -> Result<BatchReport, TransformError> {
        self.execute(TransformKind::Command, host).await
    }

    pub async fn encrypt_vault(
        &self,
        host: &mut dyn EditorHost,
    ) -> Result<BatchReport, TransformError> {
        self.execute(TransformKind::VaultEncrypt, host).await
    }

    pub async fn decrypt_vault(
        &self,
        host: &mut dyn EditorHost,
    ) -> Result<BatchReport, TransformError> {
        self.execute(TransformKind::VaultDecrypt, host).await
    }

    pub async fn execute(
        &self,
        kind: TransformKind,
        host: &mut dyn EditorHost,
    ) -> Result<BatchReport, TransformError> {
        let Some(selections) = host.active_selections() else {
            let err = TransformError::NoEditorActive;
            host.notify_info(&err.user_message());
            return Err(err);
        };

        let total = selections.len();
        tracing::debug!("Starting {:?} batch over {} selection(s)", kind, total);

        for (position, selection) in selections.iter().enumerate() {
            if let Err(err) = self.apply_one(kind, host, selection).await {
                tracing::debug!(
                    "Batch stopped at selection {} of {}: {}",
                    position + 1,
                    total,
                    err
                );
                host.notify_error(&err.user_message());
                return Err(err);
            }
        }

        Ok(BatchReport { total })
    }

    async fn apply_one(
        &self,
        kind: TransformKind,
        host: &mut dyn EditorHost,
        selection: &Selection,
    ) -> Result<(), TransformError> {
        let text = host.text(selection);
        let replacement = match kind.vault_action() {
            None => self.transform_text(&text).await?,
            Some(action) => self.vault_text(action, &text).await?,
        };

        host.replace_text(selection, &replacement)
            .await
            .map_err(|e| TransformError::Edit(format!("{:#}", e)))
    }

    /// Pipe `text` through the configured command
    pub async fn transform_text(&self, text: &str) -> Result<String, TransformError> {
        let invocation = InvocationBuilder::shell(&self.settings.command)
            .input(text)
            .timeout(self.settings.timeout)
            .build();

        let result = self.runner.run(invocation).await;
        check_result(&self.settings.command, result)
    }

    /// Run `text` through the vault program via a temporary file.
    /// The file is gone when this returns, whatever the outcome.
    pub async fn vault_text(
        &self,
        action: VaultAction,
        text: &str,
    ) -> Result<String, TransformError> {
        let file = VaultFile::create(&self.settings.temp_dir(), &action.prepare_input(text))
            .inspect_err(|e| self.output.append_line(&e.user_message()))?;

        let invocation = vault_invocation(&self.settings, action, file.path());
        let command = format!("{} {}", self.settings.vault_program, action.as_arg());
        let result = self.runner.run(invocation).await;

        let removed = file.remove();
        if let Err(e) = &removed {
            self.output.append_line(&e.user_message());
            tracing::warn!("{}", e.user_message());
        }

        let output = check_result(&command, result)?;
        removed?;
        Ok(output)
    }
}

fn check_result(command: &str, result: ExecutionResult) -> Result<String, TransformError> {
    if result.success() {
        return Ok(result.stdout);
    }

    if result.is_start_failure() {
        return Err(TransformError::ProcessStartFailure {
            command: command.to_string(),
            reason: result.stderr,
        });
    }

    if result.is_timeout() {
        return Err(TransformError::TimedOut {
            command: command.to_string(),
            detail: result.stderr,
        });
    }

    Err(TransformError::NonZeroExit {
        command: command.to_string(),
        code: result.exit_code,
        stderr: result.stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_classification() {
        assert_eq!(
            check_result("rev", ExecutionResult {
                stdout: "cba".to_string(),
                ..ExecutionResult::default()
            })
            .unwrap(),
            "cba"
        );

        assert!(matches!(
            check_result("nope", ExecutionResult::start_failure("not found")),
            Err(TransformError::ProcessStartFailure { reason, .. }) if reason == "not found"
        ));

        assert!(matches!(
            check_result("sleep 9", ExecutionResult::timed_out(std::time::Duration::from_secs(1))),
            Err(TransformError::TimedOut { .. })
        ));

        assert!(matches!(
            check_result("false", ExecutionResult {
                exit_code: 1,
                stderr: "bad".to_string(),
                ..ExecutionResult::default()
            }),
            Err(TransformError::NonZeroExit { code: 1, ref stderr, .. }) if stderr == "bad"
        ));
    }
}
