//! Telemetry samples and serial connection state.

/// One speed/RPM reading derived from a successful telemetry poll.
///
/// Samples are immutable and discarded after forwarding; the bridge never
/// buffers more than one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    /// Truck speed in km/h, rounded to the nearest integer. Negative while
    /// reversing.
    pub speed_kmh: i32,

    /// Engine RPM, rounded and clamped at zero.
    pub rpm: u32,

    /// Seconds since process start when the sample was taken (monotonic).
    pub taken_at: f64,
}

impl TelemetrySample {
    /// Derive a sample from the raw float values the telemetry server reports.
    pub fn derive(speed: f64, engine_rpm: f64, taken_at: f64) -> Self {
        Self {
            speed_kmh: speed.round() as i32,
            rpm: engine_rpm.max(0.0).round() as u32,
            taken_at,
        }
    }

    /// Line-delimited frame written to the serial device: `"<speed>,<rpm>\n"`.
    pub fn frame(&self) -> String {
        format!("{},{}\n", self.speed_kmh, self.rpm)
    }
}

/// Serial device connection state, mutated only by the bridge worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_rounds_speed() {
        let sample = TelemetrySample::derive(87.6, 1450.2, 1.0);
        assert_eq!(sample.speed_kmh, 88);
        assert_eq!(sample.rpm, 1450);
    }

    #[test]
    fn test_derive_keeps_reverse_speed_negative() {
        let sample = TelemetrySample::derive(-4.4, 800.0, 0.5);
        assert_eq!(sample.speed_kmh, -4);
    }

    #[test]
    fn test_derive_clamps_rpm_at_zero() {
        let sample = TelemetrySample::derive(0.0, -12.0, 0.0);
        assert_eq!(sample.rpm, 0);
    }

    #[test]
    fn test_frame_is_line_delimited() {
        let sample = TelemetrySample::derive(90.0, 1500.0, 2.0);
        assert_eq!(sample.frame(), "90,1500\n");
    }
}
