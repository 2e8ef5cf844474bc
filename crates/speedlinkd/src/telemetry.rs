//! Telemetry polling - HTTP client for the game's local telemetry server.
//!
//! The server (ets2-telemetry-server) exposes live game state as JSON at
//! `http://localhost:25555/api/ets2/telemetry`. Only the `truck.speed` and
//! `truck.engineRpm` fields matter here; the rest of the body is ignored.

use anyhow::Result;
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};

use speedlink_common::{TelemetryError, TelemetrySample};

/// Outcome of a single poll that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll {
    /// A fresh sample.
    Sample(TelemetrySample),
    /// The request timed out. Benign, retried next iteration.
    TimedOut,
}

/// Seam between the bridge loop and the telemetry endpoint. Tests inject
/// fakes; production uses [`HttpTelemetrySource`].
pub trait TelemetrySource: Send {
    fn poll(&mut self) -> impl Future<Output = Result<Poll, TelemetryError>> + Send;
}

/// Relevant slice of the telemetry server's JSON body.
#[derive(Debug, Deserialize)]
struct TelemetryBody {
    truck: TruckBody,
}

#[derive(Debug, Deserialize)]
struct TruckBody {
    /// Speed in km/h, negative while reversing.
    #[serde(default)]
    speed: f64,

    /// Engine RPM.
    #[serde(default, rename = "engineRpm")]
    engine_rpm: f64,
}

/// Production telemetry source backed by reqwest.
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    endpoint: String,
    started: Instant,
}

impl HttpTelemetrySource {
    /// Build a client with a per-request timeout. The timeout is the whole
    /// point: a slow endpoint must never stall the bridge loop.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            started: Instant::now(),
        })
    }

    fn derive(&self, body: TelemetryBody) -> TelemetrySample {
        TelemetrySample::derive(
            body.truck.speed,
            body.truck.engine_rpm,
            self.started.elapsed().as_secs_f64(),
        )
    }
}

impl TelemetrySource for HttpTelemetrySource {
    async fn poll(&mut self) -> Result<Poll, TelemetryError> {
        let response = match self.client.get(&self.endpoint).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Ok(Poll::TimedOut),
            Err(e) => return Err(TelemetryError::Request(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }

        let body: TelemetryBody = match response.json().await {
            Ok(b) => b,
            Err(e) if e.is_timeout() => return Ok(Poll::TimedOut),
            Err(e) => return Err(TelemetryError::Malformed(e.to_string())),
        };

        Ok(Poll::Sample(self.derive(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_telemetry_body() {
        let json = r#"{
            "game": {"connected": true, "paused": false},
            "truck": {"speed": 86.6, "engineRpm": 1435.2, "gear": 9}
        }"#;
        let body: TelemetryBody = serde_json::from_str(json).unwrap();
        assert!((body.truck.speed - 86.6).abs() < f64::EPSILON);
        assert!((body.truck.engine_rpm - 1435.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_missing_fields_default_to_zero() {
        let json = r#"{"truck": {}}"#;
        let body: TelemetryBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.truck.speed, 0.0);
        assert_eq!(body.truck.engine_rpm, 0.0);
    }

    #[test]
    fn test_parse_missing_truck_is_an_error() {
        let json = r#"{"game": {}}"#;
        assert!(serde_json::from_str::<TelemetryBody>(json).is_err());
    }
}
