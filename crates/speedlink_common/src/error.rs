//! Error types for speedlink.

use thiserror::Error;

/// Errors from the telemetry HTTP side of the bridge.
///
/// Timeouts are deliberately a separate variant: the bridge swallows them
/// instead of surfacing an error.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("telemetry request timed out")]
    Timeout,

    #[error("telemetry request failed: {0}")]
    Request(String),

    #[error("telemetry endpoint returned HTTP {0}")]
    Status(u16),

    #[error("telemetry body malformed: {0}")]
    Malformed(String),
}

/// Errors from the serial device side of the bridge.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("failed to open {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("serial write failed: {0}")]
    Write(String),

    #[error("no serial port selected")]
    NoPort,
}

/// Errors from settings persistence.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("no settings directory available")]
    NoDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
