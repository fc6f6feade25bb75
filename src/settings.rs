//! Demo settings with persistence
//!
//! Settings are saved to `~/.config/goalreach/settings.toml`

use std::fs;
use std::path::PathBuf;

use goalreach_core::RegionConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::scene::SceneSettings;

/// All demo settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Goals drawn by the planner loop before shutting down
    pub rounds: usize,
    /// Link radius for the toy roadmap
    pub connect_radius: f32,
    /// Roadmap stops growing at this many milestones
    pub max_milestones: usize,
    pub region: RegionConfig,
    pub scene: SceneSettings,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            rounds: 40,
            connect_radius: 4.0,
            max_milestones: 2000,
            region: RegionConfig::default(),
            scene: SceneSettings::default(),
        }
    }
}

impl DemoSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("goalreach"))
    }

    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Whether a settings file is present on disk
    pub fn exists() -> bool {
        Self::settings_path().is_some_and(|p| p.exists())
    }

    /// Load settings from disk, or return defaults if not found or invalid
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse and validate a settings document.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.region.validate()?;
        settings.scene.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}
