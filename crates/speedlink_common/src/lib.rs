//! Speedlink Common - Shared types for the telemetry-to-serial bridge.
//!
//! Everything the bridge worker and the dashboard exchange lives here:
//! samples, connection state, bridge events, persisted settings, errors.

pub mod error;
pub mod events;
pub mod sample;
pub mod settings;

pub use error::*;
pub use events::*;
pub use sample::*;
pub use settings::*;
