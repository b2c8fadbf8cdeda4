//! ansible-vault encrypt/decrypt through a scoped temporary file

use std::io::Write;
use std::path::Path;

use crate::config::TransformSettings;
use crate::error::TransformError;
use crate::subprocess::{Invocation, InvocationBuilder};

/// Prefix of every temporary file handed to the vault program
pub const VAULT_FILE_PREFIX: &str = "vault-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultAction {
    Encrypt,
    Decrypt,
}

impl VaultAction {
    pub fn as_arg(&self) -> &'static str {
        match self {
            VaultAction::Encrypt => "encrypt",
            VaultAction::Decrypt => "decrypt",
        }
    }

    /// Text to write into the temporary file for this action
    pub fn prepare_input(&self, text: &str) -> String {
        match self {
            VaultAction::Encrypt => text.to_string(),
            VaultAction::Decrypt => strip_leading_indent(text),
        }
    }
}

/// Remove leading spaces and tabs from every line.
///
/// Vault blocks pasted into YAML are usually indented, and the vault program
/// only accepts them flush left.
pub fn strip_leading_indent(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| line.trim_start_matches([' ', '\t']))
        .collect()
}

/// Temporary file holding the vault program's input.
///
/// The file is removed by [`VaultFile::remove`], or on drop if that is never
/// reached, and only once either way.
pub struct VaultFile {
    file: tempfile::NamedTempFile,
}

impl VaultFile {
    pub fn create(dir: &Path, contents: &str) -> Result<Self, TransformError> {
        let prefix = format!(
            "{}{}-",
            VAULT_FILE_PREFIX,
            chrono::Utc::now().timestamp_millis()
        );

        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .tempfile_in(dir)
            .map_err(|e| {
                TransformError::filesystem(
                    format!("could not create temporary file in {}", dir.display()),
                    e,
                )
            })?;

        let written = file
            .write_all(contents.as_bytes())
            .and_then(|()| file.flush());
        if let Err(e) = written {
            return Err(TransformError::filesystem(
                format!("could not write {}", file.path().display()),
                e,
            ));
        }

        tracing::trace!(
            "Wrote {} bytes to {}",
            contents.len(),
            file.path().display()
        );
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn remove(self) -> Result<(), TransformError> {
        let path = self.file.path().to_path_buf();
        self.file.close().map_err(|e| {
            TransformError::filesystem(format!("could not delete {}", path.display()), e)
        })
    }
}

/// Command line for `<vault_program> <action> <file> [--vault-password-file <path>] --output -`
pub fn vault_invocation(
    settings: &TransformSettings,
    action: VaultAction,
    file: &Path,
) -> Invocation {
    let mut builder = InvocationBuilder::program(&settings.vault_program)
        .arg(action.as_arg())
        .path_arg(file);

    if let Some(password_file) = settings.password_file() {
        builder = builder.arg("--vault-password-file").path_arg(password_file);
    }

    builder
        .args(["--output", "-"])
        .timeout(settings.timeout)
        .build()
}
