use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod loader;

pub use loader::ConfigLoader;

pub const DEFAULT_COMMAND: &str = "rev";
pub const DEFAULT_VAULT_PROGRAM: &str = "ansible-vault";

pub const ENV_COMMAND: &str = "CLI_TRANSFORM_COMMAND";
pub const ENV_VAULT_PASSWORD_FILE: &str = "CLI_TRANSFORM_VAULT_PASSWORD_FILE";
pub const ENV_VAULT_PROGRAM: &str = "CLI_TRANSFORM_VAULT_PROGRAM";
pub const ENV_TIMEOUT: &str = "CLI_TRANSFORM_TIMEOUT";
pub const ENV_TEMP_DIR: &str = "CLI_TRANSFORM_TEMP_DIR";

/// Directory holding the per-user `config.toml`
pub fn get_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "cli-transform", "cli-transform")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// Parse a human duration such as `30s` or `1m 30s`
pub fn parse_duration(value: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim())
        .with_context(|| format!("invalid duration '{}'", value))
}

/// Effective settings for the transform commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Shell command line for the generic transform
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_password_file: Option<PathBuf>,
    pub vault_program: String,
    /// Kill the command after this long. Unset waits indefinitely.
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            vault_password_file: None,
            vault_program: DEFAULT_VAULT_PROGRAM.to_string(),
            timeout: None,
            temp_dir: None,
        }
    }
}

/// A partial set of settings from one configuration source.
/// Only the fields present override what is already set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverlay {
    pub command: Option<String>,
    pub vault_password_file: Option<PathBuf>,
    pub vault_program: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub temp_dir: Option<PathBuf>,
}

impl TransformSettings {
    /// Password file to pass to the vault program; an empty path counts as unset
    pub fn password_file(&self) -> Option<&Path> {
        self.vault_password_file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Directory for vault temporary files
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn apply(&mut self, overlay: SettingsOverlay) {
        if let Some(command) = overlay.command {
            self.command = command;
        }
        if let Some(password_file) = overlay.vault_password_file {
            self.vault_password_file = Some(password_file);
        }
        if let Some(program) = overlay.vault_program {
            self.vault_program = program;
        }
        if let Some(timeout) = overlay.timeout {
            // Zero disables the limit
            self.timeout = (!timeout.is_zero()).then_some(timeout);
        }
        if let Some(dir) = overlay.temp_dir {
            self.temp_dir = Some(dir);
        }
    }

    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `CLI_TRANSFORM_*` variables using `lookup` to read them
    pub fn merge_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = match lookup(ENV_TIMEOUT) {
            Some(value) => Some(parse_duration(&value).with_context(|| format!("in {}", ENV_TIMEOUT))?),
            None => None,
        };

        self.apply(SettingsOverlay {
            command: lookup(ENV_COMMAND),
            vault_password_file: lookup(ENV_VAULT_PASSWORD_FILE).map(PathBuf::from),
            vault_program: lookup(ENV_VAULT_PROGRAM),
            timeout,
            temp_dir: lookup(ENV_TEMP_DIR).map(PathBuf::from),
        });
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = TransformSettings::default();
        assert_eq!(settings.command, "rev");
        assert_eq!(settings.vault_program, "ansible-vault");
        assert!(settings.password_file().is_none());
        assert!(settings.timeout.is_none());
        assert_eq!(settings.temp_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_overlay_only_overrides_present_fields() {
        let mut settings = TransformSettings::default();
        let overlay: SettingsOverlay = toml::from_str(
            r#"
            command = "sort -u"
            timeout = "1m 30s"
            "#,
        )
        .unwrap();

        settings.apply(overlay);
        assert_eq!(settings.command, "sort -u");
        assert_eq!(settings.timeout, Some(Duration::from_secs(90)));
        assert_eq!(settings.vault_program, "ansible-vault");
    }

    #[test]
    fn test_overlay_rejects_unknown_keys() {
        let result: Result<SettingsOverlay, _> = toml::from_str("comand = \"rev\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let mut settings = TransformSettings {
            timeout: Some(Duration::from_secs(5)),
            ..TransformSettings::default()
        };
        settings.apply(SettingsOverlay {
            timeout: Some(Duration::ZERO),
            ..SettingsOverlay::default()
        });
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn test_empty_password_file_is_unset() {
        let settings = TransformSettings {
            vault_password_file: Some(PathBuf::new()),
            ..TransformSettings::default()
        };
        assert!(settings.password_file().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_COMMAND, "tr a-z A-Z"),
            (ENV_VAULT_PASSWORD_FILE, "/etc/vault-pass"),
            (ENV_TIMEOUT, "10s"),
        ]);

        let mut settings = TransformSettings::default();
        settings
            .merge_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.command, "tr a-z A-Z");
        assert_eq!(settings.password_file(), Some(Path::new("/etc/vault-pass")));
        assert_eq!(settings.timeout, Some(Duration::from_secs(10)));
        assert_eq!(settings.vault_program, "ansible-vault");
    }

    #[test]
    fn test_env_rejects_bad_timeout() {
        let mut settings = TransformSettings::default();
        let err = settings
            .merge_env_with(|key| (key == ENV_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(format!("{:#}", err).contains(ENV_TIMEOUT));
    }

    #[test]
    fn test_settings_serialize_to_toml() {
        let settings = TransformSettings {
            timeout: Some(Duration::from_secs(30)),
            ..TransformSettings::default()
        };
        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("command = \"rev\""));
        assert!(rendered.contains("timeout = \"30s\""));
        assert!(!rendered.contains("vault_password_file"));

        let parsed: TransformSettings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, settings);
    }
}
