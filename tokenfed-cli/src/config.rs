//! CLI configuration handling.
//!
//! The CLI reads a [`FederationConfig`] from `auth.toml` in the platform
//! config directory. A missing file means defaults.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tokenfed_core::FederationConfig;

pub const CONFIG_FILE_NAME: &str = "auth.toml";

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: FederationConfig,

    /// Path that was looked at, whether or not it existed.
    pub path: PathBuf,

    pub from_file: bool,
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Load configuration from the default location or fall back to defaults.
pub fn load_config() -> Result<LoadedConfig> {
    load_config_from_path(default_config_path())
}

/// Load configuration from `path`, using defaults if it does not exist.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<LoadedConfig> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        tracing::debug!(?path, "No config file, using defaults");
        return Ok(LoadedConfig {
            config: FederationConfig::default(),
            path,
            from_file: false,
        });
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    let config: FederationConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config from {:?}", path))?;

    config
        .validate()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid config in {:?}", path))?;

    tracing::debug!(?path, auth_mode = ?config.auth_mode, "Loaded config");
    Ok(LoadedConfig {
        config,
        path,
        from_file: true,
    })
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "phengineer", "tokenfed")
}
