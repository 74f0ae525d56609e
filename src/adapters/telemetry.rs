//! Telemetry store: the network-facing side of the pipeline.
//!
//! Receives the same `{reading, state}` pushes as the panel and keeps:
//!
//! - the latest record (current snapshot),
//! - a fixed ring of the last [`HISTORY_CAPACITY`] records (oldest dropped),
//! - the sounder state reported by the alert task.
//!
//! Pushes use `try_lock` and fail fast with `SinkUnavailable` while a
//! reader holds the lock, so the sampler is never blocked by a slow query.
//! Readers get owned copies, never references into the ring.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use heapless::HistoryBuffer;
use serde::{Deserialize, Serialize};

use crate::app::health::HealthCounters;
use crate::app::ports::{ConfigError, TelemetrySink};
use crate::app::state::{HistoryRecord, Reading, SystemState};
use crate::config::{ConfigPatch, HISTORY_CAPACITY, SharedConfig};
use crate::error::PipelineError;

/// Page size when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

// ───────────────────────────────────────────────────────────────
// Query results
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub temperature: f32,
    pub humidity: f32,
    pub status: &'static str,
    pub is_valid: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub temperature: f32,
    pub humidity: f32,
    pub status: &'static str,
    pub health: HealthCounters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmStatus {
    pub buzzer_status: &'static str,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub temperature: f32,
    pub humidity: f32,
    pub status: &'static str,
    pub timestamp: u64,
}

impl From<&HistoryRecord> for HistoryEntry {
    fn from(r: &HistoryRecord) -> Self {
        Self {
            temperature: r.reading.temperature_c,
            humidity: r.reading.humidity_pct,
            status: r.state.label(),
            timestamp: r.reading.captured_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub records: Vec<HistoryEntry>,
}

/// Externally visible configuration, in the field names clients use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigView {
    pub temp_warning: f32,
    pub temp_overheat: f32,
    pub sensor_interval_ms: u32,
    pub buzzer_enabled: bool,
    /// Comfort band, read-only.
    pub humidity_min: f32,
    pub humidity_max: f32,
    pub history_capacity: u16,
}

/// Partial update as sent by clients.  Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub temp_warning: Option<f32>,
    pub temp_overheat: Option<f32>,
    pub sensor_interval_ms: Option<u32>,
    pub buzzer_enabled: Option<bool>,
}

impl From<ConfigUpdate> for ConfigPatch {
    fn from(u: ConfigUpdate) -> Self {
        Self {
            warning_threshold_c: u.temp_warning,
            overheat_threshold_c: u.temp_overheat,
            sample_interval_ms: u.sensor_interval_ms,
            alarm_enabled: u.buzzer_enabled,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Store
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
    latest: Option<HistoryRecord>,
    health: HealthCounters,
    history: HistoryBuffer<HistoryRecord, HISTORY_CAPACITY>,
}

pub struct TelemetryStore {
    inner: Mutex<Inner>,
    alarm_active: AtomicBool,
    config: SharedConfig,
}

impl TelemetryStore {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            alarm_active: AtomicBool::new(false),
            config,
        }
    }

    fn read(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        match self.read().latest {
            Some(r) => SensorSnapshot {
                temperature: r.reading.temperature_c,
                humidity: r.reading.humidity_pct,
                status: r.state.label(),
                is_valid: r.reading.valid,
                timestamp: r.reading.captured_at_ms,
            },
            None => SensorSnapshot {
                temperature: 0.0,
                humidity: 0.0,
                status: "UNKNOWN",
                is_valid: false,
                timestamp: 0,
            },
        }
    }

    pub fn status(&self) -> StatusSummary {
        let s = self.snapshot();
        StatusSummary {
            temperature: s.temperature,
            humidity: s.humidity,
            status: s.status,
            health: self.read().health,
        }
    }

    pub fn alarm(&self) -> AlarmStatus {
        let on = self.alarm_active.load(Ordering::Acquire);
        AlarmStatus {
            buzzer_status: if on { "ON" } else { "OFF" },
            is_active: on,
        }
    }

    /// Oldest-first page of the ring.  `limit` defaults to
    /// [`DEFAULT_PAGE_LIMIT`] and is clamped to `1..=capacity`.
    pub fn history(&self, offset: usize, limit: Option<usize>) -> HistoryPage {
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, HISTORY_CAPACITY);
        let inner = self.read();
        let records = inner
            .history
            .oldest_ordered()
            .skip(offset)
            .take(limit)
            .map(HistoryEntry::from)
            .collect();
        HistoryPage {
            total: inner.history.len(),
            limit,
            offset,
            records,
        }
    }

    pub fn config(&self) -> ConfigView {
        let c = self.config.snapshot();
        ConfigView {
            temp_warning: c.warning_threshold_c,
            temp_overheat: c.overheat_threshold_c,
            sensor_interval_ms: c.sample_interval_ms,
            buzzer_enabled: c.alarm_enabled,
            humidity_min: c.humidity_min_pct,
            humidity_max: c.humidity_max_pct,
            history_capacity: c.history_capacity,
        }
    }

    /// Validate and apply a client update.  On error nothing changes.
    pub fn update_config(&self, update: ConfigUpdate) -> Result<ConfigView, ConfigError> {
        self.config.update(&update.into())?;
        Ok(self.config())
    }
}

impl TelemetryStore {
    fn try_write(&self) -> Result<MutexGuard<'_, Inner>, PipelineError> {
        match self.inner.try_lock() {
            Ok(g) => Ok(g),
            Err(TryLockError::WouldBlock) => Err(PipelineError::SinkUnavailable),
            Err(TryLockError::Poisoned(p)) => Ok(p.into_inner()),
        }
    }
}

impl TelemetrySink for TelemetryStore {
    fn on_reading(&self, reading: &Reading, state: SystemState) -> Result<(), PipelineError> {
        let mut inner = self.try_write()?;
        let record = HistoryRecord {
            reading: *reading,
            state,
        };
        inner.latest = Some(record);
        inner.history.write(record);
        Ok(())
    }

    fn on_alarm(&self, active: bool) {
        self.alarm_active.store(active, Ordering::Release);
    }

    // Dropped while a reader holds the lock; the next cycle refreshes it.
    fn on_health(&self, counters: HealthCounters) {
        if let Ok(mut inner) = self.try_write() {
            inner.health = counters;
        }
    }
}
