// Session Configuration
// Runtime settings from album-sync.yaml, layered over the compiled defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;
use crate::error::ConfigError;
use crate::utilities::{paths::is_inside, resolve_path};

/// Runtime config file name
pub const CONFIG_FILE_NAME: &str = "album-sync.yaml";

/// User-editable configuration. Every field is optional; unset fields fall
/// back to the compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory whose subdirectories are the albums
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Directory on the player that mirrors the selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Mount point to ensure before applying (empty string disables mounting)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<String>,

    /// Where the sync record is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_file: Option<String>,

    /// Where the selection is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_file: Option<String>,

    /// File name patterns that qualify a file for syncing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifying_patterns: Option<Vec<String>>,

    /// Log level used when RUST_LOG is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Fully resolved settings a session runs with
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source_root: PathBuf,
    pub destination: PathBuf,
    pub mount_point: Option<PathBuf>,
    pub record_file: PathBuf,
    pub selection_file: PathBuf,
    pub qualifying_patterns: Vec<String>,
    pub log_level: String,
}

impl SessionConfig {
    /// Load session configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: SessionConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config YAML: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use the compiled defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save session configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Fill unset fields from `defaults` and resolve paths. Relative paths
    /// are taken relative to `base` (the config file's directory).
    pub fn resolve(&self, defaults: &AppConfig, base: &Path) -> Settings {
        let pick = |value: &Option<String>, default: &str| {
            resolve_path(base, value.as_deref().unwrap_or(default))
        };

        let mount_point = self
            .mount_point
            .as_deref()
            .unwrap_or(&defaults.paths.mount_point);

        Settings {
            source_root: pick(&self.source_root, &defaults.paths.source_root),
            destination: pick(&self.destination, &defaults.paths.destination),
            mount_point: (!mount_point.is_empty()).then(|| resolve_path(base, mount_point)),
            record_file: pick(&self.record_file, &defaults.paths.record_file),
            selection_file: pick(&self.selection_file, &defaults.paths.selection_file),
            qualifying_patterns: self
                .qualifying_patterns
                .clone()
                .unwrap_or_else(|| defaults.qualifying_patterns.clone()),
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| defaults.log_level.clone()),
        }
    }
}

impl Settings {
    /// Check the settings describe a usable source and a separate destination
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.source_root.is_dir() {
            return Err(ConfigError::MissingSource(self.source_root.clone()));
        }

        if is_inside(&self.destination, &self.source_root) {
            return Err(ConfigError::DestinationInsideSource {
                destination: self.destination.clone(),
                source_root: self.source_root.clone(),
            });
        }

        Ok(())
    }
}
