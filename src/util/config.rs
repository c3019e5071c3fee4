//! User configuration for capforge.
//!
//! Two configuration file locations are read:
//! - Global: `~/.capforge/config.toml` - User-wide defaults
//! - Project: `.capforge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Both only supply
//! fallbacks: values given in `Matrix.toml` or on the command line win.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// capforge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SDK settings
    pub sdk: SdkConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// SDK-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Base directory holding one `<version>_kit` directory per SDK
    pub dir: Option<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Per-step timeout used when the manifest sets none
    pub timeout_secs: Option<u64>,

    /// Put the pristine configuration document back after every run
    pub restore_config: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.sdk.dir.is_some() {
            self.sdk.dir = other.sdk.dir;
        }

        if other.build.timeout_secs.is_some() {
            self.build.timeout_secs = other.build.timeout_secs;
        }
        if other.build.restore_config {
            self.build.restore_config = true;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.capforge/config.toml)
/// 2. Global config (~/.capforge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path.filter(|p| p.exists()) {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global capforge config directory (~/.capforge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".capforge"))
}

/// Get the global config path (~/.capforge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.capforge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".capforge").join("config.toml")
}
