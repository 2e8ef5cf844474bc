//! Serial device link - owns the connection to the microcontroller.
//!
//! Fixed 115200 baud, short timeouts, line-delimited `"<speed>,<rpm>\n"`
//! frames. Connection state itself lives in the bridge loop; this module
//! only knows whether a handle is open.

use anyhow::{Context, Result};
use serialport::{ClearBuffer, SerialPort};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use speedlink_common::{LinkError, TelemetrySample};

/// Seam between the bridge loop and the serial device. Tests inject fakes;
/// production uses [`SerialLink`].
pub trait DeviceLink: Send {
    /// Open (or re-open) the link on the given port. An already-open handle
    /// is closed first.
    fn open(&mut self, port: &str) -> Result<(), LinkError>;

    /// Write one sample frame. Only called while the link is open.
    fn write_sample(&mut self, sample: &TelemetrySample) -> Result<(), LinkError>;

    /// Release the handle. Safe to call when already closed.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Production link backed by the serialport crate.
pub struct SerialLink {
    baud: u32,
    timeout: Duration,
    handle: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    pub fn new(baud: u32, timeout: Duration) -> Self {
        Self {
            baud,
            timeout,
            handle: None,
        }
    }
}

impl DeviceLink for SerialLink {
    fn open(&mut self, port: &str) -> Result<(), LinkError> {
        // Drop any previous handle before reopening.
        self.handle = None;

        let handle = serialport::new(port, self.baud)
            .timeout(self.timeout)
            .open()
            .map_err(|e| LinkError::Open {
                port: port.to_string(),
                reason: e.to_string(),
            })?;

        // Stale bytes from a previous session would desync the device.
        handle.clear(ClearBuffer::All).map_err(|e| LinkError::Open {
            port: port.to_string(),
            reason: format!("buffer clear failed: {}", e),
        })?;

        info!("Serial link open on {} at {} baud", port, self.baud);
        self.handle = Some(handle);
        Ok(())
    }

    fn write_sample(&mut self, sample: &TelemetrySample) -> Result<(), LinkError> {
        let handle = self.handle.as_mut().ok_or(LinkError::NoPort)?;
        handle
            .write_all(sample.frame().as_bytes())
            .map_err(|e| LinkError::Write(e.to_string()))?;
        Ok(())
    }

    fn close(&mut self) {
        if self.handle.take().is_some() {
            debug!("Serial link closed");
        }
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

/// Enumerate the serial ports currently present on the system.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().context("failed to enumerate serial ports")?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_starts_closed() {
        let link = SerialLink::new(115_200, Duration::from_millis(100));
        assert!(!link.is_open());
    }

    #[test]
    fn test_write_while_closed_is_no_port() {
        let mut link = SerialLink::new(115_200, Duration::from_millis(100));
        let sample = TelemetrySample::derive(50.0, 1000.0, 0.0);
        assert!(matches!(
            link.write_sample(&sample),
            Err(LinkError::NoPort)
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut link = SerialLink::new(115_200, Duration::from_millis(100));
        link.close();
        link.close();
        assert!(!link.is_open());
    }
}
