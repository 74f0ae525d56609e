//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full history without
//! touching real GPIO or a display controller.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tempwatch::app::ports::{AlarmPort, DisplaySink, SensorPort, TelemetrySink};
use tempwatch::app::state::{HistoryRecord, Reading, SystemState};
use tempwatch::error::{DecodeError, PipelineError, TimeoutStage};

// ── Alarm call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmCall {
    Sounder(bool),
    Indicator(bool),
}

// ── MockAlarm ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockAlarm {
    pub calls: Vec<AlarmCall>,
}

#[allow(dead_code)]
impl MockAlarm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sounder_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                AlarmCall::Sounder(on) => Some(*on),
                AlarmCall::Indicator(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn sounder_activations(&self) -> usize {
        self.calls
            .windows(2)
            .filter(|w| w[1] == AlarmCall::Sounder(true) && w[0] != AlarmCall::Sounder(true))
            .count()
    }
}

impl AlarmPort for MockAlarm {
    fn set_sounder(&mut self, on: bool) {
        self.calls.push(AlarmCall::Sounder(on));
    }

    fn set_indicator(&mut self, on: bool) {
        self.calls.push(AlarmCall::Indicator(on));
    }
}

// ── RecordingDisplay ──────────────────────────────────────────

/// Display sink whose pushes stay visible through a cloned handle after
/// the sink itself moved into the pipeline.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pushes: Arc<Mutex<Vec<(Reading, SystemState)>>>,
}

#[allow(dead_code)]
impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushes(&self) -> Vec<(Reading, SystemState)> {
        self.pushes.lock().unwrap().clone()
    }
}

impl DisplaySink for RecordingDisplay {
    fn on_reading(&mut self, reading: &Reading, state: SystemState) -> Result<(), PipelineError> {
        self.pushes.lock().unwrap().push((*reading, state));
        Ok(())
    }
}

// ── RecordingTelemetry ────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTelemetry {
    pub records: Mutex<Vec<HistoryRecord>>,
    pub alarms: Mutex<Vec<bool>>,
    pub reject: bool,
}

#[allow(dead_code)]
impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn last_alarm(&self) -> Option<bool> {
        self.alarms.lock().unwrap().last().copied()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn on_reading(&self, reading: &Reading, state: SystemState) -> Result<(), PipelineError> {
        if self.reject {
            return Err(PipelineError::SinkUnavailable);
        }
        self.records.lock().unwrap().push(HistoryRecord {
            reading: *reading,
            state,
        });
        Ok(())
    }

    fn on_alarm(&self, active: bool) {
        self.alarms.lock().unwrap().push(active);
    }
}

// ── ScriptedSensor ────────────────────────────────────────────

/// Replays canned results.  Once the script runs dry every read times out.
#[derive(Clone, Default)]
pub struct ScriptedSensor {
    script: Arc<Mutex<VecDeque<Result<Reading, DecodeError>>>>,
    reads: Arc<Mutex<u32>>,
}

#[allow(dead_code)]
impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(&self, temperature_c: f32, humidity_pct: f32) -> &Self {
        let at = u64::from(self.queued()) * 1_000;
        self.then(Ok(Reading::new(temperature_c, humidity_pct, at)))
    }

    pub fn then_err(&self, e: DecodeError) -> &Self {
        self.then(Err(e))
    }

    pub fn then(&self, result: Result<Reading, DecodeError>) -> &Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn reads(&self) -> u32 {
        *self.reads.lock().unwrap()
    }

    fn queued(&self) -> u32 {
        self.script.lock().unwrap().len() as u32 + self.reads()
    }
}

impl SensorPort for ScriptedSensor {
    fn read(&mut self) -> Result<Reading, DecodeError> {
        *self.reads.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DecodeError::Timeout(TimeoutStage::ResponseLow)))
    }
}
