//! Port traits: the hexagonal boundary between the pipeline and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Pipeline / AlertReactor (domain)
//! ```
//!
//! Driven adapters (the sensor decoder, the display panel, the telemetry
//! store, the alarm outputs) implement these traits.  The
//! [`Pipeline`](super::pipeline::Pipeline) consumes them via generics, so
//! the coordination core never touches hardware directly.
//!
//! ## Contract notes
//!
//! - **DisplaySink** is only ever called by the display task while it holds
//!   the bus, so calls are serialised.
//! - **TelemetrySink** is called from the sampler and MUST NOT block.
//!   Return [`PipelineError::SinkUnavailable`] instead of waiting.

use std::sync::Arc;

use crate::error::{DecodeError, PipelineError};

use super::health::HealthCounters;
use super::state::{Reading, SystemState};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the sampler calls this while holding the bus.
pub trait SensorPort {
    /// Perform one complete request/decode exchange.  A failure never
    /// yields a partial reading.
    fn read(&mut self) -> Result<Reading, DecodeError>;
}

// ───────────────────────────────────────────────────────────────
// Display sink (driven adapter: domain → panel)
// ───────────────────────────────────────────────────────────────

/// Receives one `{reading, state}` pair per successful cycle.
pub trait DisplaySink {
    fn on_reading(&mut self, reading: &Reading, state: SystemState) -> Result<(), PipelineError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink (driven adapter: domain → history / network surface)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget push interface.  Takes `&self` because the same sink is
/// read concurrently by the query surface.
pub trait TelemetrySink {
    fn on_reading(&self, reading: &Reading, state: SystemState) -> Result<(), PipelineError>;

    /// Sounder state changes reported by the alert task.
    fn on_alarm(&self, _active: bool) {}

    /// Health counters after every cycle, successful or not.
    fn on_health(&self, _counters: HealthCounters) {}
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Arc<T> {
    fn on_reading(&self, reading: &Reading, state: SystemState) -> Result<(), PipelineError> {
        (**self).on_reading(reading, state)
    }

    fn on_alarm(&self, active: bool) {
        (**self).on_alarm(active);
    }

    fn on_health(&self, counters: HealthCounters) {
        (**self).on_health(counters);
    }
}

// ───────────────────────────────────────────────────────────────
// Alarm port (driven adapter: domain → sounder + indicator)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the alert reactor commands its two binary outputs.
pub trait AlarmPort {
    fn set_sounder(&mut self, on: bool);

    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Rejected configuration.  Invalid ranges are reported, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
