//! Bridge configuration.
//!
//! Loads settings from the XDG config dir or uses defaults. Everything here
//! has a sensible default; the file is optional.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Config file name under the speedlink config dir.
pub const CONFIG_FILE: &str = "config.toml";

/// Telemetry endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Telemetry endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in milliseconds. Timed-out polls are retried
    /// silently on the next iteration.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:25555/api/ets2/telemetry".to_string()
}

fn default_http_timeout_ms() -> u64 {
    100
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

/// Serial device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Baud rate for the serial link.
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Serial read/write timeout in milliseconds.
    #[serde(default = "default_serial_timeout_ms")]
    pub serial_timeout_ms: u64,

    /// Minimum spacing between reconnect attempts in seconds.
    #[serde(default = "default_reconnect_interval_secs")]
    pub reconnect_interval_secs: u64,
}

fn default_baud() -> u32 {
    115_200
}

fn default_serial_timeout_ms() -> u64 {
    100
}

fn default_reconnect_interval_secs() -> u64 {
    5
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            baud: default_baud(),
            serial_timeout_ms: default_serial_timeout_ms(),
            reconnect_interval_secs: default_reconnect_interval_secs(),
        }
    }
}

/// Bridge loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Minimum interval between successful updates in milliseconds.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Capacity of the bounded event channel to the presentation layer.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_update_interval_ms() -> u64 {
    20
}

fn default_event_capacity() -> usize {
    32
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Full bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default, rename = "loop")]
    pub bridge_loop: LoopConfig,
}

impl Config {
    /// Load config from the default location, or return defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path).unwrap_or_else(|e| {
                warn!("Config malformed, using defaults: {}", e);
                Config::default()
            }),
            _ => Config::default(),
        }
    }

    /// Default config file path under the XDG config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("speedlink").join(CONFIG_FILE))
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.telemetry.http_timeout_ms)
    }

    pub fn serial_timeout(&self) -> Duration {
        Duration::from_millis(self.device.serial_timeout_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.device.reconnect_interval_secs)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.bridge_loop.update_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.telemetry.endpoint,
            "http://localhost:25555/api/ets2/telemetry"
        );
        assert_eq!(config.telemetry.http_timeout_ms, 100);
        assert_eq!(config.device.baud, 115_200);
        assert_eq!(config.device.reconnect_interval_secs, 5);
        assert_eq!(config.bridge_loop.update_interval_ms, 20);
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let toml_str = r#"
[telemetry]
endpoint = "http://127.0.0.1:9999/api/ets2/telemetry"

[device]
baud = 57600
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.telemetry.endpoint, "http://127.0.0.1:9999/api/ets2/telemetry");
        assert_eq!(config.device.baud, 57600);
        // Defaults for missing fields
        assert_eq!(config.telemetry.http_timeout_ms, 100);
        assert_eq!(config.device.reconnect_interval_secs, 5);
        assert_eq!(config.bridge_loop.event_capacity, 32);
    }

    #[test]
    fn test_loop_section_rename() {
        let toml_str = r#"
[loop]
update_interval_ms = 50
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bridge_loop.update_interval_ms, 50);
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.http_timeout(), Duration::from_millis(100));
        assert_eq!(config.reconnect_interval(), Duration::from_secs(5));
        assert_eq!(config.update_interval(), Duration::from_millis(20));
    }
}
