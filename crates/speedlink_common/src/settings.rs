//! Persisted user settings.
//!
//! A flat JSON file. Loaded once at startup, rewritten on each toggle.
//!
//! Path discovery fallback chain:
//! 1. `$SPEEDLINK_SETTINGS` environment variable (explicit override)
//! 2. XDG config dir: `~/.config/speedlink/settings.json`
//! 3. `~/.speedlink-settings.json` (home fallback)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::SettingsError;

/// Env var overriding the settings file location.
pub const SETTINGS_ENV: &str = "SPEEDLINK_SETTINGS";

/// User settings, owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the telemetry server executable.
    #[serde(default)]
    pub telemetry_path: String,

    /// Launch the telemetry server automatically at startup.
    #[serde(default)]
    pub auto_launch_telemetry: bool,

    /// Keep running minimized instead of exiting on close.
    #[serde(default = "default_minimize_to_tray")]
    pub minimize_to_tray: bool,
}

fn default_minimize_to_tray() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telemetry_path: String::new(),
            auto_launch_telemetry: false,
            minimize_to_tray: default_minimize_to_tray(),
        }
    }
}

impl Settings {
    /// Discover the settings file path.
    pub fn discover_path() -> Result<PathBuf, SettingsError> {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            return Ok(PathBuf::from(path));
        }
        if let Some(config) = dirs::config_dir() {
            return Ok(config.join("speedlink").join("settings.json"));
        }
        if let Some(home) = dirs::home_dir() {
            return Ok(home.join(".speedlink-settings.json"));
        }
        Err(SettingsError::NoDirectory)
    }

    /// Load settings from the discovered path, or defaults when missing.
    pub fn load() -> Self {
        match Self::discover_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("Settings path unavailable, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Load settings from a specific file, or defaults when missing/broken.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    debug!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Settings file malformed, using defaults: {}", e);
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        }
    }

    /// Save settings to the discovered path.
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::discover_path()?;
        self.save_to(&path)
    }

    /// Save settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.telemetry_path, "");
        assert!(!settings.auto_launch_telemetry);
        assert!(settings.minimize_to_tray);
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings {
            telemetry_path: "/opt/ets2-telemetry/server.exe".to_string(),
            auto_launch_telemetry: true,
            minimize_to_tray: false,
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_malformed_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_applies_field_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"telemetry_path": "/tmp/srv"}"#).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.telemetry_path, "/tmp/srv");
        assert!(!loaded.auto_launch_telemetry);
        assert!(loaded.minimize_to_tray);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep").join("nested").join("settings.json");
        Settings::default().save_to(&path).unwrap();
        assert!(path.exists());
    }
}
