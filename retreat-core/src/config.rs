//! Global retreat configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RetreatError, RetreatResult};
use crate::remote::Remote;

static DEFAULT_DATA_PATH: &str = "~/retreat";

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn is_default_data_path(p: &PathBuf) -> bool {
    *p == default_data_path()
}

/// Global configuration at ~/.config/retreat/config.toml
///
/// Remote mirroring is configured here too; the `[remote]` table is
/// written by `retreat auth` and carries provider-specific settings.
#[derive(Serialize, Deserialize, Clone)]
pub struct RetreatConfig {
    #[serde(default = "default_data_path", skip_serializing_if = "is_default_data_path")]
    pub data_dir: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<Remote>,
}

impl Default for RetreatConfig {
    fn default() -> Self {
        RetreatConfig {
            data_dir: default_data_path(),
            remote: None,
        }
    }
}

impl RetreatConfig {
    pub fn config_path() -> RetreatResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RetreatError::Config("Could not determine config directory".into()))?
            .join("retreat");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> RetreatResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| RetreatError::Config(format!("Could not read config file: {e}")))?;

        toml::from_str(&content).map_err(|e| RetreatError::Config(e.to_string()))
    }

    /// Save the current config to ~/.config/retreat/config.toml
    pub fn save(&self) -> RetreatResult<()> {
        let config_path = Self::config_path()?;

        let content =
            toml::to_string_pretty(self).map_err(|e| RetreatError::Config(e.to_string()))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RetreatError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(&config_path, content)
            .map_err(|e| RetreatError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &std::path::Path) -> RetreatResult<()> {
        let contents = format!(
            "\
# retreat configuration

# Where your retreat data lives:
# data_dir = \"{}\"

# Remote mirroring is configured by `retreat auth <provider>`:
# [remote]
# provider = \"firebase\"
",
            DEFAULT_DATA_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RetreatError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RetreatError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Data directory in display-friendly form, keeping `~` unexpanded.
    pub fn display_path(&self) -> PathBuf {
        self.data_dir.clone()
    }
}
