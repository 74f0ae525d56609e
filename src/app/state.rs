//! Domain values shared by every stage of the pipeline, and the state
//! classifier.

use serde::Serialize;

/// One decoded sensor sample.
///
/// Only readings with `valid == true` are ever forwarded to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// Monotonic milliseconds since boot.
    pub captured_at_ms: u64,
    pub valid: bool,
}

impl Reading {
    pub fn new(temperature_c: f32, humidity_pct: f32, captured_at_ms: u64) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            captured_at_ms,
            valid: true,
        }
    }
}

/// Exactly one of these holds at any instant.  Derived solely from
/// temperature; humidity never drives state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SystemState {
    #[default]
    Normal,
    Warning,
    Overheat,
    /// Reserved for init/decode failure paths; [`classify`] never returns it.
    Error,
}

impl SystemState {
    /// Short label used on the panel and the telemetry surface.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Overheat => "DANGER!",
            Self::Error => "ERROR",
        }
    }

    pub const fn severity(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Warning => 1,
            Self::Overheat => 2,
            Self::Error => 3,
        }
    }
}

impl core::fmt::Display for SystemState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a temperature to a state.  Equality resolves toward the higher
/// severity.  NaN compares false everywhere and lands on Normal.
pub fn classify(temperature_c: f32, warning_c: f32, overheat_c: f32) -> SystemState {
    if temperature_c >= overheat_c {
        SystemState::Overheat
    } else if temperature_c >= warning_c {
        SystemState::Warning
    } else {
        SystemState::Normal
    }
}

/// Emitted when a classification changes the state.  Logged and acted
/// upon, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertSignal {
    pub state: SystemState,
    pub value: f32,
    pub timestamp_ms: u64,
}

/// Immutable `{reading, state}` snapshot owned by the telemetry ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRecord {
    pub reading: Reading,
    pub state: SystemState,
}

/// One-slot display hand-off payload.  Pairing the reading with its state
/// keeps both from the same cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayFrame {
    pub reading: Reading,
    pub state: SystemState,
}
