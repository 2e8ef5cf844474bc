//! Logging setup.
//!
//! Headless and one-shot commands log to stderr. The TUI owns the terminal,
//! so it logs to a file instead.
//!
//! Log file fallback chain:
//! 1. `$SPEEDLINK_LOG_FILE` environment variable (explicit override)
//! 2. `$XDG_STATE_HOME/speedlink/speedlinkd.log`
//! 3. `~/.local/state/speedlink/speedlinkd.log`

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Env var overriding the log file location.
pub const LOG_FILE_ENV: &str = "SPEEDLINK_LOG_FILE";

fn discover_log_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(LOG_FILE_ENV) {
        return Some(PathBuf::from(path));
    }
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg_state).join("speedlink").join("speedlinkd.log"));
    }
    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".local/state/speedlink/speedlinkd.log"));
    }
    None
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr. For headless runs and one-shot commands.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Log to a file so the TUI keeps the terminal to itself. Falls back to
/// stderr when no file location is available.
pub fn init_file() -> Result<()> {
    let Some(path) = discover_log_path() else {
        init_stderr();
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
