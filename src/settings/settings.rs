// Player settings and persistence
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PlayerError;

/// Colors used to paint the filled portion of range controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressColors {
    pub fill: String,  // Hex color code e.g. "#007bff"
    pub track: String,
}

impl Default for ProgressColors {
    fn default() -> Self {
        Self {
            fill: "#007bff".to_string(),
            track: "#ddd".to_string(),
        }
    }
}

/// Banner timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    pub duration_ms: u64,
    pub error_duration_ms: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            duration_ms: 7000,
            error_duration_ms: 10000,
        }
    }
}

/// Main player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub version: i32, // Settings schema version for future migrations
    /// Filename used when the source reference carries none
    pub default_filename: String,
    /// Address of the hosting page; a source equal to it never had real audio assigned
    pub page_address: String,
    /// Clock-tick cadence of media elements
    pub time_update_interval_ms: u64,
    pub download_dir: Option<PathBuf>,
    /// Content-type prefix accepted when attaching synthesized audio
    pub accepted_content_type: String,
    pub progress: ProgressColors,
    pub alerts: AlertSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: 1,
            default_filename: "generated_audio.mp3".to_string(),
            page_address: "about:blank".to_string(),
            time_update_interval_ms: 250,
            download_dir: None,
            accepted_content_type: "audio/".to_string(),
            progress: ProgressColors::default(),
            alerts: AlertSettings::default(),
        }
    }
}

impl PlayerSettings {
    /// Get the settings file path
    pub fn get_settings_path(app_dir: &Path) -> PathBuf {
        app_dir.join("player_settings.json")
    }

    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load(app_dir: &Path) -> Result<Self, PlayerError> {
        let path = Self::get_settings_path(app_dir);

        if !path.exists() {
            log::info!("[Settings] No settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| PlayerError::Settings(format!("Failed to read settings file: {}", e)))?;

        let settings: PlayerSettings = serde_json::from_str(&content)
            .map_err(|e| PlayerError::Settings(format!("Failed to parse settings: {}", e)))?;

        log::info!("[Settings] Loaded settings from {:?}", path);
        Ok(settings.validated())
    }

    /// Save settings to file
    pub fn save(&self, app_dir: &Path) -> Result<(), PlayerError> {
        // Ensure directory exists
        fs::create_dir_all(app_dir).map_err(|e| {
            PlayerError::Settings(format!("Failed to create settings directory: {}", e))
        })?;

        let path = Self::get_settings_path(app_dir);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PlayerError::Settings(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&path, content)
            .map_err(|e| PlayerError::Settings(format!("Failed to write settings file: {}", e)))?;

        log::info!("[Settings] Saved settings to {:?}", path);
        Ok(())
    }

    /// Clamp out-of-range values instead of rejecting the whole file
    pub fn validated(mut self) -> Self {
        if self.default_filename.trim().is_empty() {
            self.default_filename = Self::default().default_filename;
        }
        if self.time_update_interval_ms == 0 {
            self.time_update_interval_ms = 250;
        }
        self
    }

    /// Directory downloads are written to
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("ttsplayer").join("downloads"))
    }
}
