//! Coordination core: one sample cycle and its fan-out.
//!
//! ```text
//!  ticker ──tick──▶ sampler ──lock bus──▶ sensor.read()
//!                      │                     │ ok
//!                      │             classify + register.publish
//!                      │                     │ unlock bus
//!                      ├──▶ display slot (1, overwrite) ─┐
//!                      ├──▶ telemetry.on_reading (never blocks)
//!                      ├──▶ display_ready ──▶ display task ──lock bus──▶ panel
//!                      └──▶ edge ──────────▶ alert task ──▶ AlertReactor
//! ```
//!
//! Everything the tasks share lives in one [`Pipeline`] built once at
//! startup and handed to each task by `Arc`.  There are no process-wide
//! singletons.
//!
//! The bus lock *owns* the bus-attached devices ([`BusDevices`]), so neither
//! the sensor nor the display panel can be touched without holding it.

use core::cell::RefCell;
use core::future::Future;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use crate::adapters::time::Uptime;
use crate::config::SharedConfig;
use crate::error::DecodeError;

use super::alert::{AlarmSettings, AlertReactor};
use super::health::{HealthCounters, SampleHealth};
use super::ports::{AlarmPort, DisplaySink, SensorPort, TelemetrySink};
use super::register::StateRegister;
use super::state::{AlertSignal, DisplayFrame, SystemState, classify};

type Raw = CriticalSectionRawMutex;

/// Devices that share the physical bus.  Reachable only through the bus lock.
pub struct BusDevices<S, D> {
    pub sensor: S,
    pub display: D,
}

/// Result of one sampler cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Reading classified and fanned out.  `alert` is set when the state changed.
    Published {
        frame: DisplayFrame,
        alert: Option<AlertSignal>,
    },
    /// Decoder failed; state untouched, nothing pushed.
    DecodeFailed(DecodeError),
    /// Bus not acquired within its bounded wait; state untouched.
    BusBusy,
}

/// Result of one display-consumer pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayOutcome {
    Rendered(DisplayFrame),
    /// No data-ready signal or no frame inside the wait window.
    Idle,
    BusBusy(DisplayFrame),
    SinkFailed(DisplayFrame),
}

/// Race `fut` against a timer.  `None` if the timer wins.
pub async fn with_timeout<F: Future>(fut: F, timeout: Duration) -> Option<F::Output> {
    futures_lite::future::or(async { Some(fut.await) }, async {
        async_io_mini::Timer::after(timeout).await;
        None
    })
    .await
}

fn ms(v: u32) -> Duration {
    Duration::from_millis(u64::from(v))
}

pub struct Pipeline<S, D, T> {
    bus: Mutex<Raw, BusDevices<S, D>>,
    register: StateRegister,
    tick: Signal<Raw, ()>,
    edge: Signal<Raw, ()>,
    display_ready: Signal<Raw, ()>,
    display_slot: Channel<Raw, DisplayFrame, 1>,
    telemetry: T,
    config: SharedConfig,
    health: BlockingMutex<Raw, RefCell<SampleHealth>>,
    clock: Uptime,
}

impl<S, D, T> Pipeline<S, D, T>
where
    S: SensorPort,
    D: DisplaySink,
    T: TelemetrySink,
{
    pub fn new(sensor: S, display: D, telemetry: T, config: SharedConfig) -> Self {
        Self {
            bus: Mutex::new(BusDevices { sensor, display }),
            register: StateRegister::new(),
            tick: Signal::new(),
            edge: Signal::new(),
            display_ready: Signal::new(),
            display_slot: Channel::new(),
            telemetry,
            config,
            health: BlockingMutex::new(RefCell::new(SampleHealth::default())),
            clock: Uptime::new(),
        }
    }

    pub fn register(&self) -> &StateRegister {
        &self.register
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn health(&self) -> HealthCounters {
        self.health.lock(|h| h.borrow().counters())
    }

    /// Bus lock, for other bus users and for tests that need to hold it.
    pub fn bus(&self) -> &Mutex<Raw, BusDevices<S, D>> {
        &self.bus
    }

    // ── Sampler ──────────────────────────────────────────────

    /// One full cycle: acquire the bus, decode, classify, publish, fan out.
    pub async fn sample_once(&self) -> CycleOutcome {
        let cfg = self.config.snapshot();

        let Some(mut bus) = with_timeout(self.bus.lock(), ms(cfg.bus_timeout_ms)).await else {
            warn!(
                "Sampler: bus busy for {}ms, skipping cycle",
                cfg.bus_timeout_ms
            );
            self.health.lock(|h| h.borrow_mut().record_contention());
            self.telemetry.on_health(self.health());
            return CycleOutcome::BusBusy;
        };

        let reading = match bus.sensor.read() {
            Ok(r) if r.valid => r,
            Ok(_) => {
                drop(bus);
                return self.decode_failed(DecodeError::OutOfRange);
            }
            Err(e) => {
                drop(bus);
                return self.decode_failed(e);
            }
        };

        let state = classify(
            reading.temperature_c,
            cfg.warning_threshold_c,
            cfg.overheat_threshold_c,
        );
        let prev = self.register.publish(state);
        drop(bus);

        self.health.lock(|h| h.borrow_mut().record_success());
        self.telemetry.on_health(self.health());
        debug!(
            "SAMPLE | T={:.1}C H={:.1}% state={}",
            reading.temperature_c, reading.humidity_pct, state
        );

        let alert = (prev != state).then(|| AlertSignal {
            state,
            value: reading.temperature_c,
            timestamp_ms: reading.captured_at_ms,
        });
        if let Some(a) = &alert {
            info!("STATE | {} -> {} at {:.1}C", prev, a.state, a.value);
        }

        let frame = DisplayFrame { reading, state };
        self.hand_off(frame);
        if let Err(e) = self.telemetry.on_reading(&reading, state) {
            warn!("Sampler: telemetry push dropped: {}", e);
        }

        // Leftover readiness from a missed cycle must not look like this one.
        self.display_ready.reset();
        self.display_ready.signal(());
        self.edge.signal(());

        CycleOutcome::Published { frame, alert }
    }

    fn decode_failed(&self, e: DecodeError) -> CycleOutcome {
        warn!("Sampler: sensor read failed: {}", e);
        self.health.lock(|h| h.borrow_mut().record_decode_failure(e));
        self.telemetry.on_health(self.health());
        CycleOutcome::DecodeFailed(e)
    }

    /// Put `frame` in the one-slot hand-off, replacing an unconsumed one.
    fn hand_off(&self, frame: DisplayFrame) {
        if let Err(TrySendError::Full(frame)) = self.display_slot.try_send(frame) {
            debug!("Sampler: display behind, overwriting pending frame");
            let _ = self.display_slot.try_receive();
            if self.display_slot.try_send(frame).is_err() {
                warn!("Sampler: display slot still full, frame dropped");
            }
        }
    }

    /// Periodic trigger.  Only signals; the sampler does the work.
    /// The interval is re-read every tick.
    pub async fn tick_loop(&self) {
        loop {
            let interval = self.config.snapshot().sample_interval_ms;
            async_io_mini::Timer::after(ms(interval)).await;
            self.tick.signal(());
        }
    }

    pub async fn sample_loop(&self) {
        loop {
            self.tick.wait().await;
            let _ = self.sample_once().await;
        }
    }

    // ── Display consumer ─────────────────────────────────────

    /// Take the pending frame without waiting.
    pub fn try_take_frame(&self) -> Option<DisplayFrame> {
        self.display_slot.try_receive().ok()
    }

    /// Wait for data-ready, fetch the frame, render it under the bus lock.
    pub async fn display_once(&self) -> DisplayOutcome {
        let cfg = self.config.snapshot();

        if with_timeout(self.display_ready.wait(), ms(cfg.display_ready_timeout_ms))
            .await
            .is_none()
        {
            return DisplayOutcome::Idle;
        }
        let Some(frame) =
            with_timeout(self.display_slot.receive(), ms(cfg.display_fetch_timeout_ms)).await
        else {
            return DisplayOutcome::Idle;
        };

        let Some(mut bus) = with_timeout(self.bus.lock(), ms(cfg.bus_timeout_ms)).await else {
            warn!("Display: bus busy, frame skipped");
            return DisplayOutcome::BusBusy(frame);
        };
        match bus.display.on_reading(&frame.reading, frame.state) {
            Ok(()) => DisplayOutcome::Rendered(frame),
            Err(e) => {
                warn!("Display: push dropped: {}", e);
                DisplayOutcome::SinkFailed(frame)
            }
        }
    }

    pub async fn display_loop(&self) {
        loop {
            let _ = self.display_once().await;
        }
    }

    // ── Alert consumer ───────────────────────────────────────

    /// Block on the edge (and the auto-silence deadline, if armed), then
    /// drive the reactor.  The edge wait has no timeout of its own.
    pub async fn alert_once<A: AlarmPort>(&self, reactor: &mut AlertReactor<A>) {
        let woke_by_edge = match reactor.silence_deadline_ms() {
            Some(deadline) => {
                let remaining = deadline.saturating_sub(self.clock.uptime_ms());
                with_timeout(self.edge.wait(), Duration::from_millis(remaining))
                    .await
                    .is_some()
            }
            None => {
                self.edge.wait().await;
                true
            }
        };

        let now = self.clock.uptime_ms();
        reactor.on_silence_expired(now);
        if woke_by_edge {
            if let Some(state) = self.register.take_edge() {
                let cfg = self.config.snapshot();
                let settings = AlarmSettings {
                    enabled: cfg.alarm_enabled,
                    duration_ms: cfg.alarm_duration_ms,
                };
                reactor.on_edge(state, now, settings);
            }
        }
        self.telemetry.on_alarm(reactor.sounder_on());
    }

    pub async fn alert_loop<A: AlarmPort>(&self, reactor: &mut AlertReactor<A>) {
        loop {
            self.alert_once(reactor).await;
        }
    }

    /// Current state as the alert consumer would see it.
    pub fn current_state(&self) -> SystemState {
        self.register.current()
    }
}
