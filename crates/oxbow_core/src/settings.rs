//! Persistent Settings Management
//!
//! Saves and restores the strip's parameter state as JSON.
//!
//! # Storage Locations
//! - Linux: `~/.config/oxbow/settings.json`
//! - Windows: `%APPDATA%\oxbow\settings.json`
//! - macOS: `~/Library/Application Support/com.oxbow.oxbow/settings.json`

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{StripError, StripResult};
use crate::params::{ParameterSnapshot, StripParameters};

/// Root settings structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSettings {
    pub parameters: ParameterSnapshot,
}

impl StripSettings {
    /// Capture the current state of a live parameter block
    pub fn from_parameters(parameters: &StripParameters) -> Self {
        Self {
            parameters: parameters.snapshot(),
        }
    }

    /// Push the stored state into a live parameter block (values are clamped)
    pub fn apply_to(&self, parameters: &StripParameters) {
        parameters.apply(&self.parameters);
    }

    /// Load settings from the platform config file, or defaults if missing/corrupt
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("Could not determine config directory, using default settings");
            return Self::default();
        };

        if path.exists() {
            match Self::load_from(&path) {
                Ok(settings) => {
                    info!("Settings loaded from {:?}", path);
                    return settings;
                }
                Err(e) => {
                    error!("Failed to load settings file {:?}: {}", path, e);
                }
            }
        }

        info!("Using default settings");
        Self::default()
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> StripResult<Self> {
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Save settings to the platform config file
    pub fn save(&self) -> StripResult<PathBuf> {
        let path = Self::config_path().ok_or(StripError::NoConfigDirectory)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> StripResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Platform-specific configuration file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "oxbow", "oxbow")
            .map(|proj| proj.config_dir().join("settings.json"))
    }
}
