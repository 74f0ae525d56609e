//! Temperature-watch firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  Dht22 (SensorPort)   TextPanel<LogPanel> (DisplaySink)      │
//! │  TelemetryStore (TelemetrySink) ◀── HTTP API                 │
//! │  AlarmOutputs (AlarmPort)                                    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Pipeline: sampler · display · alert (AlertReactor)    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use log::info;

use tempwatch::adapters::log_sink::LogPanel;
use tempwatch::adapters::panel::TextPanel;
use tempwatch::adapters::telemetry::TelemetryStore;
use tempwatch::app::alert::AlertReactor;
use tempwatch::app::tasks::spawn_pipeline;
use tempwatch::drivers::alarm::AlarmOutputs;
use tempwatch::drivers::hw_init;
#[cfg(target_os = "espidf")]
use tempwatch::pins;
use tempwatch::sensors::Dht22;
use tempwatch::{Pipeline, SharedConfig, SystemConfig};

fn banner() {
    info!("╔══════════════════════════════════════╗");
    info!("║  TempWatch v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use esp_idf_hal::delay::Delay;
    use esp_idf_hal::gpio::{PinDriver, Pull};
    use esp_idf_hal::peripherals::Peripherals;

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    banner();

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_alarm_gpio()?;
    let peripherals = Peripherals::take()?;
    const _: () = assert!(pins::DHT_GPIO == 4, "typed pin below must match the pin map");
    let mut line = PinDriver::input_output_od(peripherals.pins.gpio4)?;
    line.set_pull(Pull::Up)?;
    info!("DHT22 data line on GPIO{}", pins::DHT_GPIO);
    // Waits of 1 ms and longer yield to the scheduler; shorter ones spin.
    let sensor = Dht22::new(line, Delay::new(1_000));

    // ── 3. Shared context ─────────────────────────────────────
    let config = SharedConfig::new(SystemConfig::default())?;
    let telemetry = Arc::new(TelemetryStore::new(config.clone()));
    let display = TextPanel::new(LogPanel::new());
    let pipeline = Arc::new(Pipeline::new(
        sensor,
        display,
        Arc::clone(&telemetry),
        config,
    ));
    let reactor = AlertReactor::new(AlarmOutputs::new());

    // ── 4. Network surface + tasks ────────────────────────────
    let _server = tempwatch::adapters::http_api::start_server(Arc::clone(&telemetry))?;
    let _tasks = spawn_pipeline(&pipeline, reactor)?;
    info!("Startup complete");

    loop {
        std::thread::park();
    }
}

// ── Host simulation ───────────────────────────────────────────

/// Runs the full pipeline against a simulated wire whose temperature
/// ramps through warning and overheat, then cools back down.
#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use std::time::Duration;

    use tempwatch::sensors::sim::SimWire;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    banner();

    hw_init::init_alarm_gpio()?;
    let wire = SimWire::new(22.0, 45.0);
    let (line, delay) = wire.split();
    let sensor = Dht22::new(line, delay);

    let config = SharedConfig::new(SystemConfig::default())?;
    let telemetry = Arc::new(TelemetryStore::new(config.clone()));
    let pipeline = Arc::new(Pipeline::new(
        sensor,
        TextPanel::new(LogPanel::new()),
        Arc::clone(&telemetry),
        config,
    ));
    let tasks = spawn_pipeline(&pipeline, AlertReactor::new(AlarmOutputs::new()))?;
    info!("Startup complete (simulation)");

    let profile = [22.0, 30.0, 36.0, 40.0, 46.0, 48.0, 47.0, 38.0, 25.0, 21.0];
    for t in profile.iter().copied().cycle() {
        wire.set_reading(t, 45.0);
        std::thread::sleep(Duration::from_secs(3));
        let snap = telemetry.snapshot();
        info!(
            "SIM | set={:.1}C seen={:.1}C status={} buzzer={}",
            t,
            snap.temperature,
            snap.status,
            telemetry.alarm().buzzer_status
        );
        if tasks.sampler.is_finished() {
            break;
        }
    }

    tasks
        .sampler
        .join()
        .map_err(|_| anyhow::anyhow!("sampler task panicked"))?;
    Ok(())
}
