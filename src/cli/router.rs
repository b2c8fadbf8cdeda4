//! Command routing and execution
//!
//! Opens the document named on the command line as a [`BufferHost`], runs the
//! requested transform over it and writes the result back out.

use crate::cli::args::{Cli, Commands, DocumentArgs, VaultArgs};
use crate::config::{ConfigLoader, SettingsOverlay, TransformSettings};
use crate::subprocess::{OutputSink, TokioProcessRunner, TracingOutput};
use crate::transform::{
    each_line, line_range, BufferHost, Notification, TransformKind, TransformOrchestrator,
};
use anyhow::{bail, Context, Result};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            command,
            timeout,
            document,
        } => {
            let overlay = SettingsOverlay {
                command,
                timeout,
                ..SettingsOverlay::default()
            };
            let settings = load_settings(config, overlay).await?;
            run_batch(TransformKind::Command, settings, &document).await
        }
        Commands::Encrypt { vault, document } => {
            let settings = load_settings(config, vault_overlay(vault)).await?;
            run_batch(TransformKind::VaultEncrypt, settings, &document).await
        }
        Commands::Decrypt { vault, document } => {
            let settings = load_settings(config, vault_overlay(vault)).await?;
            run_batch(TransformKind::VaultDecrypt, settings, &document).await
        }
        Commands::Config => {
            let settings = load_settings(config, SettingsOverlay::default()).await?;
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}

fn vault_overlay(vault: VaultArgs) -> SettingsOverlay {
    SettingsOverlay {
        vault_password_file: vault.vault_password_file,
        timeout: vault.timeout,
        ..SettingsOverlay::default()
    }
}

/// Defaults, then user config, then `--config`, then environment, then flags
async fn load_settings(config: Option<&Path>, flags: SettingsOverlay) -> Result<TransformSettings> {
    let mut loader = ConfigLoader::new();
    loader.load_user_config().await?;
    if let Some(path) = config {
        loader.load_file(path).await?;
    }
    loader.merge_env_vars()?;
    loader.apply(flags);

    tracing::debug!("Config sources: {:?}", loader.sources());
    Ok(loader.into_settings())
}

async fn run_batch(
    kind: TransformKind,
    settings: TransformSettings,
    document: &DocumentArgs,
) -> Result<()> {
    if document.in_place && is_stdin(document.file.as_deref()) {
        bail!("--in-place needs a file path, not stdin");
    }

    let text = read_document(document).await?;
    let mut host = build_host(text, document)?;

    let output: Arc<dyn OutputSink> = Arc::new(TracingOutput);
    let runner = Arc::new(TokioProcessRunner::new(Arc::clone(&output)));
    let orchestrator = TransformOrchestrator::new(runner, output, settings);

    let outcome = orchestrator.execute(kind, &mut host).await;
    print_notifications(host.notifications());

    // Selections applied before a failure stay applied
    if outcome.is_ok() || host.edit_count() > 0 {
        if let Some(text) = host.into_text() {
            write_document(document, &text).await?;
        }
    }

    let report = outcome?;
    tracing::debug!("Transformed {} selection(s)", report.total);
    Ok(())
}

fn is_stdin(file: Option<&Path>) -> bool {
    file.map_or(true, |path| path == Path::new("-"))
}

/// Read the document, or `None` when there is nothing to read
async fn read_document(document: &DocumentArgs) -> Result<Option<String>> {
    match document.file.as_deref() {
        Some(path) if !is_stdin(Some(path)) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Some(text))
        }
        _ => {
            if std::io::stdin().is_terminal() {
                tracing::debug!("No file given and stdin is a terminal");
                return Ok(None);
            }
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read stdin")?;
            Ok(Some(text))
        }
    }
}

fn build_host(text: Option<String>, document: &DocumentArgs) -> Result<BufferHost> {
    let Some(text) = text else {
        return Ok(BufferHost::detached());
    };

    if document.each_line {
        let ranges = each_line(&text);
        return Ok(BufferHost::with_ranges(text, ranges)?);
    }

    let mut ranges = document.select.clone();
    for span in &document.lines {
        ranges.push(line_range(&text, span.first, span.last)?);
    }

    if ranges.is_empty() {
        Ok(BufferHost::new(text))
    } else {
        Ok(BufferHost::with_ranges(text, ranges)?)
    }
}

async fn write_document(document: &DocumentArgs, text: &str) -> Result<()> {
    let target = if document.in_place {
        document.file.as_deref()
    } else {
        document.output.as_deref()
    };

    match target {
        Some(path) => tokio::fs::write(path, text)
            .await
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(text.as_bytes())
                .await
                .context("failed to write stdout")?;
            stdout.flush().await.context("failed to write stdout")
        }
    }
}

fn print_notifications(notifications: &[Notification]) {
    for notification in notifications {
        match notification {
            Notification::Info(message) => eprintln!("info: {}", message),
            Notification::Error(message) => eprintln!("error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::LineSpan;
    use crate::transform::{EditorHost, SelectionError};

    #[test]
    fn test_build_host_defaults_to_whole_document() {
        let host = build_host(Some("abc".to_string()), &DocumentArgs::default()).unwrap();
        let selections = host.active_selections().unwrap();
        assert_eq!(selections.len(), 1);
        assert_eq!(host.text(&selections[0]), "abc");
    }

    #[test]
    fn test_build_host_without_document() {
        let host = build_host(None, &DocumentArgs::default()).unwrap();
        assert!(host.active_selections().is_none());
    }

    #[test]
    fn test_build_host_combines_ranges_and_lines() {
        let document = DocumentArgs {
            select: vec![0..1],
            lines: vec![LineSpan { first: 2, last: 2 }],
            ..DocumentArgs::default()
        };
        let host = build_host(Some("a\nbb\ncc".to_string()), &document).unwrap();

        let texts: Vec<_> = host
            .active_selections()
            .unwrap()
            .iter()
            .map(|s| host.text(s))
            .collect();
        assert_eq!(texts, vec!["a", "bb\n"]);
    }

    #[test]
    fn test_build_host_each_line() {
        let document = DocumentArgs {
            each_line: true,
            ..DocumentArgs::default()
        };
        let host = build_host(Some("x\ny\n".to_string()), &document).unwrap();
        assert_eq!(host.active_selections().unwrap().len(), 2);
    }

    #[test]
    fn test_build_host_rejects_bad_lines() {
        let document = DocumentArgs {
            lines: vec![LineSpan { first: 4, last: 4 }],
            ..DocumentArgs::default()
        };
        let err = build_host(Some("one line".to_string()), &document).unwrap_err();
        assert!(err.downcast_ref::<SelectionError>().is_some());
    }

    #[test]
    fn test_is_stdin() {
        assert!(is_stdin(None));
        assert!(is_stdin(Some(Path::new("-"))));
        assert!(!is_stdin(Some(Path::new("notes.txt"))));
    }

    #[tokio::test]
    async fn test_write_document_to_output_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out.txt");
        let document = DocumentArgs {
            output: Some(target.clone()),
            ..DocumentArgs::default()
        };

        write_document(&document, "done").await.unwrap();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "done");
    }
}
