//! Telemetry server launcher.
//!
//! The game does not expose HTTP itself; a companion server process does.
//! This spawns it from the path stored in settings and forgets about it.

use anyhow::{anyhow, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

use speedlink_common::Settings;

/// Spawn the configured telemetry server executable.
pub fn launch(settings: &Settings) -> Result<()> {
    let path = settings.telemetry_path.trim();
    if path.is_empty() {
        return Err(anyhow!("telemetry server path is not set"));
    }
    if !Path::new(path).exists() {
        return Err(anyhow!("telemetry server path does not exist: {}", path));
    }

    Command::new(path)
        .spawn()
        .map_err(|e| anyhow!("failed to launch telemetry server: {}", e))?;
    info!("Launched telemetry server: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_an_error() {
        let settings = Settings::default();
        let err = launch(&settings).unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let settings = Settings {
            telemetry_path: "/definitely/not/here".to_string(),
            ..Settings::default()
        };
        let err = launch(&settings).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
