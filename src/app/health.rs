//! Sample-health tracker.
//!
//! Runs after every sample cycle and keeps failure counters.  The sampler
//! logs each failed cycle itself; this tracker only logs the escalation.
//! It is purely observational: a run of failed cycles never
//! changes [`SystemState`](super::state::SystemState), so the last
//! trustworthy reading stays in force everywhere.
//!
//! ## Fault lifecycle
//!
//! 1. `threshold` consecutive failures → the sensor fault is SET (one `error!`).
//! 2. First success while the fault is set → fault CLEARED (`info!`).

use log::{error, info};
use serde::Serialize;

use crate::error::{DecodeError, PipelineError};

/// Consecutive failed cycles before the sensor is reported unresponsive.
pub const DEFAULT_FAULT_THRESHOLD: u32 = 5;

/// Counter snapshot exposed on the status surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthCounters {
    pub consecutive_failures: u32,
    pub total_failures: u32,
    pub bus_contentions: u32,
    pub successes: u32,
    pub sensor_fault: bool,
}

pub struct SampleHealth {
    threshold: u32,
    counters: HealthCounters,
}

impl Default for SampleHealth {
    fn default() -> Self {
        Self::new(DEFAULT_FAULT_THRESHOLD)
    }
}

impl SampleHealth {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            counters: HealthCounters::default(),
        }
    }

    pub fn record_success(&mut self) {
        self.counters.successes = self.counters.successes.saturating_add(1);
        if self.counters.sensor_fault {
            info!(
                "SENSOR FAULT CLEARED after {} failed cycles",
                self.counters.consecutive_failures
            );
            self.counters.sensor_fault = false;
        }
        self.counters.consecutive_failures = 0;
    }

    pub fn record_decode_failure(&mut self, err: DecodeError) {
        self.bump_failure(&err);
    }

    pub fn record_contention(&mut self) {
        self.counters.bus_contentions = self.counters.bus_contentions.saturating_add(1);
        self.bump_failure(&PipelineError::BusContention);
    }

    pub fn counters(&self) -> HealthCounters {
        self.counters
    }

    fn bump_failure(&mut self, cause: &dyn core::fmt::Display) {
        let c = &mut self.counters;
        c.total_failures = c.total_failures.saturating_add(1);
        c.consecutive_failures = c.consecutive_failures.saturating_add(1);

        if !c.sensor_fault && c.consecutive_failures >= self.threshold {
            c.sensor_fault = true;
            error!(
                "SENSOR FAULT SET: {} consecutive failed cycles (last: {})",
                c.consecutive_failures, cause
            );
        }
    }
}
