//! HTTP dispatcher over a telemetry store fed by the real pipeline.

use std::sync::Arc;

use futures_lite::future::block_on;
use serde_json::Value;

use tempwatch::Pipeline;
use tempwatch::adapters::http_api::{Method, handle};
use tempwatch::adapters::telemetry::TelemetryStore;
use tempwatch::app::alert::AlertReactor;
use tempwatch::config::{SharedConfig, SystemConfig};

use crate::mock_hw::{MockAlarm, RecordingDisplay, ScriptedSensor};

fn setup() -> (
    ScriptedSensor,
    Arc<TelemetryStore>,
    Pipeline<ScriptedSensor, RecordingDisplay, Arc<TelemetryStore>>,
) {
    let config = SharedConfig::new(SystemConfig::default()).unwrap();
    let store = Arc::new(TelemetryStore::new(config.clone()));
    let sensor = ScriptedSensor::new();
    let p = Pipeline::new(
        sensor.clone(),
        RecordingDisplay::new(),
        Arc::clone(&store),
        config,
    );
    (sensor, store, p)
}

fn get(store: &TelemetryStore, path: &str, query: Option<&str>) -> (u16, Value) {
    let resp = handle(store, Method::Get, path, query, &[]);
    (resp.status, serde_json::from_str(&resp.body).unwrap())
}

fn post(store: &TelemetryStore, path: &str, body: &str) -> (u16, Value) {
    let resp = handle(store, Method::Post, path, None, body.as_bytes());
    (resp.status, serde_json::from_str(&resp.body).unwrap())
}

#[test]
fn sensor_and_status_follow_the_pipeline() {
    let (sensor, store, p) = setup();

    let (code, body) = get(&store, "/api/sensor", None);
    assert_eq!(code, 200);
    assert_eq!(body["is_valid"], false);

    sensor.then_ok(46.0, 30.0);
    block_on(p.sample_once());

    let (_, body) = get(&store, "/api/sensor", None);
    assert_eq!(body["is_valid"], true);
    assert_eq!(body["status"], "DANGER!");
    assert!((body["temperature"].as_f64().unwrap() - 46.0).abs() < 1e-3);

    let (_, body) = get(&store, "/api/status", None);
    assert_eq!(body["status"], "DANGER!");
    assert_eq!(body["health"]["successes"], 1);
}

#[test]
fn status_reports_failures_without_changing_state() {
    let (sensor, store, p) = setup();
    sensor.then_ok(20.0, 40.0);
    block_on(p.sample_once());
    block_on(p.sample_once()); // script exhausted: timeout

    let (_, body) = get(&store, "/api/status", None);
    assert_eq!(body["status"], "NORMAL");
    assert_eq!(body["health"]["consecutive_failures"], 1);
    assert_eq!(body["health"]["total_failures"], 1);
}

#[test]
fn buzzer_reflects_the_alert_task() {
    let (sensor, store, p) = setup();
    let mut reactor = AlertReactor::new(MockAlarm::new());

    let (_, body) = get(&store, "/api/buzzer", None);
    assert_eq!(body["buzzer_status"], "OFF");

    sensor.then_ok(47.0, 30.0);
    block_on(p.sample_once());
    block_on(p.alert_once(&mut reactor));

    let (_, body) = get(&store, "/api/buzzer", None);
    assert_eq!(body["buzzer_status"], "ON");
    assert_eq!(body["is_active"], true);
}

#[test]
fn history_pages_oldest_first() {
    let (sensor, store, p) = setup();
    for i in 0..15 {
        sensor.then_ok(25.0 + i as f32, 40.0);
    }
    for _ in 0..15 {
        block_on(p.sample_once());
    }

    let (code, body) = get(&store, "/api/history", None);
    assert_eq!(code, 200);
    assert_eq!(body["total"], 15);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["records"].as_array().unwrap().len(), 10);
    assert!((body["records"][0]["temperature"].as_f64().unwrap() - 25.0).abs() < 1e-3);

    let (_, body) = get(&store, "/api/history", Some("offset=12&limit=10"));
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert!((records[2]["temperature"].as_f64().unwrap() - 39.0).abs() < 1e-3);
    assert_eq!(records[2]["status"], "WARNING");
}

#[test]
fn config_post_applies_on_next_cycle() {
    let (sensor, store, p) = setup();

    let (code, body) = post(&store, "/api/config", r#"{"temp_overheat": 50.0}"#);
    assert_eq!(code, 200);
    assert!((body["temp_overheat"].as_f64().unwrap() - 50.0).abs() < 1e-3);
    assert!((body["temp_warning"].as_f64().unwrap() - 35.0).abs() < 1e-3);

    // Lowering overheat below the current warning is rejected as a whole.
    let (code, body) = post(&store, "/api/config", r#"{"temp_overheat": 30.0}"#);
    assert_eq!(code, 400);
    assert!(body["error"].is_string());

    let (code, _) = post(
        &store,
        "/api/config",
        r#"{"temp_warning": 25.0, "temp_overheat": 30.0}"#,
    );
    assert_eq!(code, 200);

    sensor.then_ok(31.0, 40.0);
    block_on(p.sample_once());
    let (_, body) = get(&store, "/api/sensor", None);
    assert_eq!(body["status"], "DANGER!");
}

#[test]
fn invalid_config_leaves_config_unchanged() {
    let (_, store, _) = setup();
    let before = get(&store, "/api/config", None).1;

    for bad in [
        r#"{"temp_warning": 0}"#,
        r#"{"temp_overheat": 100}"#,
        r#"{"sensor_interval_ms": 5}"#,
        r#"not json"#,
    ] {
        let (code, _) = post(&store, "/api/config", bad);
        assert_eq!(code, 400, "body {bad} must be rejected");
    }
    assert_eq!(get(&store, "/api/config", None).1, before);
}

#[test]
fn unknown_routes_are_404() {
    let (_, store, _) = setup();
    assert_eq!(get(&store, "/api/nope", None).0, 404);
    assert_eq!(post(&store, "/api/sensor", "{}").0, 404);
    assert_eq!(get(&store, "/", None).0, 404);
}

#[test]
fn config_reports_comfort_band_and_history_capacity() {
    let (_, store, _) = setup();

    let (code, body) = get(&store, "/api/config", None);
    assert_eq!(code, 200);
    assert!((body["humidity_min"].as_f64().unwrap() - 30.0).abs() < 1e-3);
    assert!((body["humidity_max"].as_f64().unwrap() - 80.0).abs() < 1e-3);
    assert_eq!(body["history_capacity"], 100);

    // Read-only over HTTP: the field is ignored, the rest applies.
    let (code, body) = post(
        &store,
        "/api/config",
        r#"{"humidity_min": 10.0, "sensor_interval_ms": 2000}"#,
    );
    assert_eq!(code, 200);
    assert_eq!(body["sensor_interval_ms"], 2000);
    assert!((body["humidity_min"].as_f64().unwrap() - 30.0).abs() < 1e-3);
}
