//! Autostart registration - a single named desktop entry pointing at the
//! running executable.
//!
//! Uses the XDG autostart directory (`~/.config/autostart`). The directory
//! can be overridden via `$SPEEDLINK_AUTOSTART_DIR`, which the tests use.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Entry file name under the autostart directory.
pub const ENTRY_NAME: &str = "speedlink.desktop";

/// Env var overriding the autostart directory.
pub const AUTOSTART_ENV: &str = "SPEEDLINK_AUTOSTART_DIR";

fn autostart_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(AUTOSTART_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|d| d.join("autostart"))
        .context("no config directory available")
}

fn entry_path() -> Result<PathBuf> {
    Ok(autostart_dir()?.join(ENTRY_NAME))
}

/// Register the running executable to start at login.
pub fn enable() -> Result<()> {
    let exe = std::env::current_exe().context("cannot resolve current executable")?;
    let path = entry_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let entry = format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Speedlink\n\
         Comment=Telemetry to serial gauge bridge\n\
         Exec={}\n\
         X-GNOME-Autostart-enabled=true\n",
        exe.display()
    );
    fs::write(&path, entry)?;
    info!("Autostart entry written to {}", path.display());
    Ok(())
}

/// Remove the autostart entry. Removing an absent entry is fine.
pub fn disable() -> Result<()> {
    let path = entry_path()?;
    if path.exists() {
        fs::remove_file(&path)?;
        info!("Autostart entry removed");
    }
    Ok(())
}

/// Whether the autostart entry currently exists.
pub fn is_enabled() -> bool {
    entry_path().map(|p| p.exists()).unwrap_or(false)
}

/// Toggle to match `wanted`, returning the resulting state.
pub fn set_enabled(wanted: bool) -> Result<bool> {
    if wanted {
        enable()?;
    } else {
        disable()?;
    }
    Ok(is_enabled())
}
