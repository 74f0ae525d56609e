//! Pipeline integration tests: one cycle at a time, driven with `block_on`.

use futures_lite::future::block_on;

use tempwatch::Pipeline;
use tempwatch::app::alert::{AlertPhase, AlertReactor};
use tempwatch::app::pipeline::{CycleOutcome, DisplayOutcome};
use tempwatch::app::state::{Reading, SystemState};
use tempwatch::config::{SharedConfig, SystemConfig};
use tempwatch::error::{DecodeError, TimeoutStage};
use tempwatch::sensors::Dht22;
use tempwatch::sensors::sim::{SimFault, SimWire};

use crate::mock_hw::{MockAlarm, RecordingDisplay, RecordingTelemetry, ScriptedSensor};

type TestPipeline = Pipeline<ScriptedSensor, RecordingDisplay, RecordingTelemetry>;

fn pipeline(sensor: &ScriptedSensor, display: &RecordingDisplay) -> TestPipeline {
    Pipeline::new(
        sensor.clone(),
        display.clone(),
        RecordingTelemetry::new(),
        SharedConfig::new(SystemConfig::default()).unwrap(),
    )
}

fn published_state(outcome: CycleOutcome) -> SystemState {
    match outcome {
        CycleOutcome::Published { frame, .. } => frame.state,
        other => panic!("expected Published, got {:?}", other),
    }
}

// ── Sampler ───────────────────────────────────────────────────

#[test]
fn full_cycle_fans_out_to_every_consumer() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(36.2, 41.0);
    let display = RecordingDisplay::new();
    let p = pipeline(&sensor, &display);

    let outcome = block_on(p.sample_once());
    let CycleOutcome::Published { frame, alert } = outcome else {
        panic!("expected Published, got {:?}", outcome);
    };
    assert_eq!(frame.state, SystemState::Warning);
    let alert = alert.expect("Normal -> Warning is a change");
    assert_eq!(alert.state, SystemState::Warning);
    assert!((alert.value - 36.2).abs() < 1e-4);

    assert_eq!(p.current_state(), SystemState::Warning);
    assert!(p.register().has_edge());
    let records = p.telemetry().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, SystemState::Warning);

    assert_eq!(block_on(p.display_once()), DisplayOutcome::Rendered(frame));
    assert_eq!(display.pushes(), vec![(frame.reading, SystemState::Warning)]);
}

#[test]
fn unchanged_state_still_raises_edge_without_alert() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(20.0, 40.0).then_ok(21.0, 40.0);
    let p = pipeline(&sensor, &RecordingDisplay::new());

    block_on(p.sample_once());
    assert_eq!(p.register().take_edge(), Some(SystemState::Normal));

    let CycleOutcome::Published { alert, .. } = block_on(p.sample_once()) else {
        panic!("expected Published");
    };
    assert!(alert.is_none());
    assert_eq!(p.register().take_edge(), Some(SystemState::Normal));
}

#[test]
fn decode_timeout_leaves_everything_untouched() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(46.0, 30.0);
    sensor.then_err(DecodeError::Timeout(TimeoutStage::BitStart(17)));
    let display = RecordingDisplay::new();
    let p = pipeline(&sensor, &display);

    block_on(p.sample_once());
    assert_eq!(p.register().take_edge(), Some(SystemState::Overheat));
    let _ = p.try_take_frame();

    let outcome = block_on(p.sample_once());
    assert_eq!(
        outcome,
        CycleOutcome::DecodeFailed(DecodeError::Timeout(TimeoutStage::BitStart(17)))
    );
    assert_eq!(p.current_state(), SystemState::Overheat);
    assert!(!p.register().has_edge());
    assert_eq!(p.try_take_frame(), None);
    assert_eq!(p.telemetry().records().len(), 1);
    assert_eq!(p.health().total_failures, 1);
}

#[test]
fn invalid_reading_is_treated_as_out_of_range() {
    let sensor = ScriptedSensor::new();
    let mut r = Reading::new(25.0, 50.0, 0);
    r.valid = false;
    sensor.then(Ok(r));
    let p = pipeline(&sensor, &RecordingDisplay::new());

    assert_eq!(
        block_on(p.sample_once()),
        CycleOutcome::DecodeFailed(DecodeError::OutOfRange)
    );
    assert!(p.telemetry().records().is_empty());
}

#[test]
fn bus_held_elsewhere_skips_the_cycle() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(20.0, 40.0);
    let p = pipeline(&sensor, &RecordingDisplay::new());

    let outcome = block_on(async {
        let _held = p.bus().lock().await;
        p.sample_once().await
    });
    assert_eq!(outcome, CycleOutcome::BusBusy);
    assert_eq!(sensor.reads(), 0);
    assert_eq!(p.health().bus_contentions, 1);
    assert!(!p.register().has_edge());

    // Lock released: the scripted reading is still waiting.
    assert_eq!(published_state(block_on(p.sample_once())), SystemState::Normal);
}

#[test]
fn repeated_failures_set_and_clear_sensor_fault() {
    let sensor = ScriptedSensor::new();
    for _ in 0..5 {
        sensor.then_err(DecodeError::ChecksumMismatch);
    }
    sensor.then_ok(22.0, 40.0);
    let p = pipeline(&sensor, &RecordingDisplay::new());

    for _ in 0..5 {
        block_on(p.sample_once());
    }
    assert!(p.health().sensor_fault);
    assert_eq!(p.current_state(), SystemState::Normal);

    block_on(p.sample_once());
    let h = p.health();
    assert!(!h.sensor_fault);
    assert_eq!(h.consecutive_failures, 0);
    assert_eq!(h.total_failures, 5);
}

#[test]
fn rejected_telemetry_push_does_not_stall_the_cycle() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(20.0, 40.0);
    let p = Pipeline::new(
        sensor.clone(),
        RecordingDisplay::new(),
        RecordingTelemetry::rejecting(),
        SharedConfig::new(SystemConfig::default()).unwrap(),
    );
    assert_eq!(published_state(block_on(p.sample_once())), SystemState::Normal);
    assert!(p.try_take_frame().is_some());
}

// ── Display hand-off ──────────────────────────────────────────

#[test]
fn unconsumed_frame_is_overwritten_by_newer() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(20.0, 40.0).then_ok(40.0, 40.0);
    let display = RecordingDisplay::new();
    let p = pipeline(&sensor, &display);

    block_on(p.sample_once());
    block_on(p.sample_once());

    let DisplayOutcome::Rendered(frame) = block_on(p.display_once()) else {
        panic!("expected a render");
    };
    assert_eq!(frame.state, SystemState::Warning);
    assert!((frame.reading.temperature_c - 40.0).abs() < 1e-4);
    assert_eq!(display.pushes().len(), 1);
    assert_eq!(p.try_take_frame(), None);
}

#[test]
fn display_without_data_goes_idle() {
    let p = pipeline(&ScriptedSensor::new(), &RecordingDisplay::new());
    assert_eq!(block_on(p.display_once()), DisplayOutcome::Idle);
}

#[test]
fn display_waits_out_a_held_bus() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(20.0, 40.0);
    let display = RecordingDisplay::new();
    let p = pipeline(&sensor, &display);
    block_on(p.sample_once());

    let outcome = block_on(async {
        let _held = p.bus().lock().await;
        p.display_once().await
    });
    assert!(matches!(outcome, DisplayOutcome::BusBusy(_)));
    assert!(display.pushes().is_empty());
}

// ── Alert consumer ────────────────────────────────────────────

#[test]
fn overheat_reading_sounds_the_alarm() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(46.0, 30.0);
    let p = pipeline(&sensor, &RecordingDisplay::new());
    let mut reactor = AlertReactor::new(MockAlarm::new());

    let outcome = block_on(p.sample_once());
    assert_eq!(published_state(outcome), SystemState::Overheat);

    block_on(p.alert_once(&mut reactor));
    assert_eq!(reactor.phase(), AlertPhase::Sounding);
    assert!(reactor.sounder_on());
    assert!(reactor.indicator_on());
    assert!(reactor.silence_deadline_ms().is_some());
    assert!(reactor.outputs().sounder_on());
    assert_eq!(p.telemetry().last_alarm(), Some(true));
}

#[test]
fn cooling_back_to_normal_cancels_the_alarm() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(46.0, 30.0).then_ok(20.0, 30.0);
    let p = pipeline(&sensor, &RecordingDisplay::new());
    let mut reactor = AlertReactor::new(MockAlarm::new());

    block_on(p.sample_once());
    block_on(p.alert_once(&mut reactor));
    assert!(reactor.sounder_on());

    block_on(p.sample_once());
    block_on(p.alert_once(&mut reactor));
    assert_eq!(reactor.phase(), AlertPhase::IdleNormal);
    assert!(!reactor.sounder_on());
    assert!(!reactor.indicator_on());
    assert_eq!(reactor.silence_deadline_ms(), None);
    assert_eq!(p.telemetry().last_alarm(), Some(false));
}

#[test]
fn disabled_alarm_keeps_indicator_only() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(46.0, 30.0);
    let p = pipeline(&sensor, &RecordingDisplay::new());
    p.config()
        .update(&tempwatch::config::ConfigPatch {
            alarm_enabled: Some(false),
            ..Default::default()
        })
        .unwrap();
    let mut reactor = AlertReactor::new(MockAlarm::new());

    block_on(p.sample_once());
    block_on(p.alert_once(&mut reactor));
    assert!(!reactor.sounder_on());
    assert!(reactor.indicator_on());
    assert_eq!(reactor.silence_deadline_ms(), None);
}

#[test]
fn live_threshold_update_applies_next_cycle() {
    let sensor = ScriptedSensor::new();
    sensor.then_ok(40.0, 30.0).then_ok(40.0, 30.0);
    let p = pipeline(&sensor, &RecordingDisplay::new());

    assert_eq!(published_state(block_on(p.sample_once())), SystemState::Warning);
    p.config()
        .update(&tempwatch::config::ConfigPatch {
            overheat_threshold_c: Some(39.5),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(published_state(block_on(p.sample_once())), SystemState::Overheat);
}

// ── Decoder in the loop ───────────────────────────────────────

#[test]
fn simulated_wire_end_to_end() {
    let wire = SimWire::new(46.3, 28.5);
    let (line, delay) = wire.split();
    let p = Pipeline::new(
        Dht22::new(line, delay),
        RecordingDisplay::new(),
        RecordingTelemetry::new(),
        SharedConfig::new(SystemConfig::default()).unwrap(),
    );

    let CycleOutcome::Published { frame, .. } = block_on(p.sample_once()) else {
        panic!("expected Published");
    };
    assert_eq!(frame.state, SystemState::Overheat);
    assert!((frame.reading.temperature_c - 46.3).abs() < 0.051);
    assert!((frame.reading.humidity_pct - 28.5).abs() < 0.051);
    assert!(wire.line_is_idle());

    wire.set_fault(SimFault::CorruptChecksum);
    assert_eq!(
        block_on(p.sample_once()),
        CycleOutcome::DecodeFailed(DecodeError::ChecksumMismatch)
    );
    assert_eq!(p.current_state(), SystemState::Overheat);

    wire.set_fault(SimFault::NoResponse);
    assert!(matches!(
        block_on(p.sample_once()),
        CycleOutcome::DecodeFailed(DecodeError::Timeout(_))
    ));
    assert!(wire.line_is_idle());
}
