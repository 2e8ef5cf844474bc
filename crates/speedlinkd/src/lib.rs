//! Speedlink daemon library - exposes modules for testing.

pub mod autostart;
pub mod bridge;
pub mod config;
pub mod device;
pub mod launcher;
pub mod logging;
pub mod telemetry;
pub mod tui;
