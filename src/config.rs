//! System configuration parameters
//!
//! All tunable parameters for the TempWatch monitor.  The live copy sits
//! behind a [`SharedConfig`] handle so the HTTP surface can change
//! thresholds and the sample interval while the tasks keep running.

use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Capacity of the telemetry history ring.
pub const HISTORY_CAPACITY: usize = 100;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Thresholds ---
    /// Temperature (°C) at or above which the state is Warning
    pub warning_threshold_c: f32,
    /// Temperature (°C) at or above which the state is Overheat
    pub overheat_threshold_c: f32,
    /// Comfort band, informational only (never drives state)
    pub humidity_min_pct: f32,
    pub humidity_max_pct: f32,

    // --- Alarm ---
    /// Master enable for the sounder; the indicator is always driven
    pub alarm_enabled: bool,
    /// One-shot auto-silence duration (milliseconds)
    pub alarm_duration_ms: u32,

    // --- Timing ---
    /// Sensor sample period (milliseconds)
    pub sample_interval_ms: u32,
    /// Bounded wait for the shared bus (milliseconds)
    pub bus_timeout_ms: u32,
    /// Display consumer wait on the data-ready signal (milliseconds)
    pub display_ready_timeout_ms: u32,
    /// Display consumer fetch from the hand-off slot (milliseconds)
    pub display_fetch_timeout_ms: u32,

    // --- Telemetry ---
    pub history_capacity: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thresholds
            warning_threshold_c: 35.0,
            overheat_threshold_c: 45.0,
            humidity_min_pct: 30.0,
            humidity_max_pct: 80.0,

            // Alarm
            alarm_enabled: true,
            alarm_duration_ms: 10_000,

            // Timing
            sample_interval_ms: 1000, // 1 Hz
            bus_timeout_ms: 100,
            display_ready_timeout_ms: 200,
            display_fetch_timeout_ms: 100,

            history_capacity: HISTORY_CAPACITY as u16,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !threshold_ok(self.warning_threshold_c) {
            return Err(ConfigError::ValidationFailed(
                "warning_threshold_c must be within (0, 100)",
            ));
        }
        if !threshold_ok(self.overheat_threshold_c) {
            return Err(ConfigError::ValidationFailed(
                "overheat_threshold_c must be within (0, 100)",
            ));
        }
        if self.warning_threshold_c > self.overheat_threshold_c {
            return Err(ConfigError::ValidationFailed(
                "warning_threshold_c must be <= overheat_threshold_c",
            ));
        }
        if !(100..=60_000).contains(&self.sample_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must be 100–60000",
            ));
        }
        if !(1_000..=600_000).contains(&self.alarm_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "alarm_duration_ms must be 1000–600000",
            ));
        }
        if !(1..=1_000).contains(&self.bus_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "bus_timeout_ms must be 1–1000",
            ));
        }
        Ok(())
    }

    /// Apply a partial update on a copy; the caller decides whether to commit.
    pub fn merged(&self, patch: &ConfigPatch) -> Self {
        let mut next = self.clone();
        if let Some(v) = patch.warning_threshold_c {
            next.warning_threshold_c = v;
        }
        if let Some(v) = patch.overheat_threshold_c {
            next.overheat_threshold_c = v;
        }
        if let Some(v) = patch.sample_interval_ms {
            next.sample_interval_ms = v;
        }
        if let Some(v) = patch.alarm_enabled {
            next.alarm_enabled = v;
        }
        next
    }
}

fn threshold_ok(v: f32) -> bool {
    v.is_finite() && v > 0.0 && v < 100.0
}

/// Runtime-updatable subset of [`SystemConfig`].  `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigPatch {
    pub warning_threshold_c: Option<f32>,
    pub overheat_threshold_c: Option<f32>,
    pub sample_interval_ms: Option<u32>,
    pub alarm_enabled: Option<bool>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ───────────────────────────────────────────────────────────────
// Live configuration handle
// ───────────────────────────────────────────────────────────────

/// Cloneable handle to the single live configuration.
///
/// Readers take a copy with [`snapshot`](Self::snapshot) and never hold the
/// lock across a suspension point.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<Mutex<SystemConfig>>,
}

impl SharedConfig {
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Mutex::new(config)),
        })
    }

    pub fn snapshot(&self) -> SystemConfig {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge `patch`, validate the result, and commit only if it is valid.
    pub fn update(&self, patch: &ConfigPatch) -> Result<SystemConfig, ConfigError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let next = guard.merged(patch);
        if let Err(e) = next.validate() {
            warn!("Config update rejected: {}", e);
            return Err(e);
        }
        *guard = next.clone();
        info!(
            "Config updated: warning={:.1}C overheat={:.1}C interval={}ms alarm={}",
            next.warning_threshold_c,
            next.overheat_threshold_c,
            next.sample_interval_ms,
            next.alarm_enabled
        );
        Ok(next)
    }
}
