//! Bridge events.
//!
//! The worker and the presentation layer talk over an explicit bounded
//! channel of these events instead of push callbacks:
//!
//! ```text
//! +---------------+     +----------------+     +-----------------+
//! | bridge worker | --> | mpsc (bounded) | --> | tui / headless  |
//! | (emits)       |     |                |     | (renders)       |
//! +---------------+     +----------------+     +-----------------+
//! ```

use std::fmt;

use crate::sample::{ConnectionState, TelemetrySample};

/// Event pushed from the bridge worker to whoever is presenting.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Serial connection state changed.
    Link(ConnectionState),

    /// A telemetry sample was polled and forwarded. Lossy: when the consumer
    /// has not drained the previous sample, the new one is dropped.
    Sample(TelemetrySample),

    /// Something went wrong. Emitted once per failure; HTTP timeouts never
    /// produce one.
    Error(String),
}

impl fmt::Display for BridgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeEvent::Link(ConnectionState::Connected) => write!(f, "link up"),
            BridgeEvent::Link(ConnectionState::Disconnected) => write!(f, "link down"),
            BridgeEvent::Sample(s) => write!(f, "{} km/h @ {} rpm", s.speed_kmh, s.rpm),
            BridgeEvent::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(
            BridgeEvent::Link(ConnectionState::Connected).to_string(),
            "link up"
        );
        let sample = TelemetrySample::derive(72.0, 1300.0, 0.0);
        assert_eq!(BridgeEvent::Sample(sample).to_string(), "72 km/h @ 1300 rpm");
        assert_eq!(
            BridgeEvent::Error("boom".into()).to_string(),
            "error: boom"
        );
    }
}
