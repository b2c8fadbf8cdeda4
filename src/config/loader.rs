use super::{get_config_dir, SettingsOverlay, TransformSettings};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Builds [`TransformSettings`] from defaults, config files and the environment.
///
/// Sources are applied in call order; later sources win field by field.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    settings: TransformSettings,
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `<config_dir>/config.toml` if it exists
    pub async fn load_user_config(&mut self) -> Result<()> {
        let path = get_config_dir()?.join("config.toml");
        if fs::try_exists(&path).await.unwrap_or(false) {
            self.load_file(&path).await?;
        } else {
            tracing::trace!("No user config at {}", path.display());
        }
        Ok(())
    }

    /// Load an explicitly requested file, which must exist
    pub async fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let overlay: SettingsOverlay = toml::from_str(&content)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;

        tracing::debug!("Loaded config from {}", path.display());
        self.settings.apply(overlay);
        self.sources.push(path.to_path_buf());
        Ok(())
    }

    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.settings.merge_env_vars()
    }

    pub fn apply(&mut self, overlay: SettingsOverlay) {
        self.settings.apply(overlay);
    }

    /// Files that contributed to the settings, in load order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn settings(&self) -> &TransformSettings {
        &self.settings
    }

    pub fn into_settings(self) -> TransformSettings {
        self.settings
    }
}
