//! Simulated DHT22 wire for host builds and tests.
//!
//! [`SimLine`] (the data pin) and [`SimDelay`] share one virtual
//! nanosecond clock.  The delay advances the clock, the pin reports the level
//! the sensor waveform has at the current instant, and nothing ever sleeps.
//! So a full 40-bit exchange runs in microseconds of real time and is
//! fully deterministic.
//!
//! The simulated sensor only answers a start pulse held low for at least
//! 18 ms, like the real part.

use core::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use super::dht22::{Frame, encode_frame};

const MIN_START_NS: u64 = 18_000_000;
/// Sensor pulls the line low this long after the host releases it.
const RESPONSE_LATENCY_US: u32 = 20;
const RESPONSE_LOW_US: u32 = 80;
const RESPONSE_HIGH_US: u32 = 80;
const BIT_LOW_US: u32 = 50;
const ZERO_HIGH_US: u32 = 27;
const ONE_HIGH_US: u32 = 70;
/// Held-low segment used for a stalled sensor.
const FOREVER_US: u32 = u32::MAX;

/// Failure injected into the next exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimFault {
    #[default]
    None,
    /// Sensor ignores the start pulse.
    NoResponse,
    /// Checksum byte is off by one.
    CorruptChecksum,
    /// Sensor pulls low at the start of bit `n` and never lets go.
    StallAtBit(u8),
}

#[derive(Debug)]
struct Waveform {
    start_ns: u64,
    /// `(level_high, duration_us)` segments after `start_ns`.
    segments: Vec<(bool, u32)>,
}

impl Waveform {
    fn level_at(&self, now_ns: u64) -> bool {
        let Some(mut offset_us) = now_ns.checked_sub(self.start_ns).map(|ns| ns / 1_000) else {
            return true;
        };
        for &(high, dur) in &self.segments {
            if offset_us < u64::from(dur) {
                return high;
            }
            offset_us -= u64::from(dur);
        }
        true
    }
}

#[derive(Debug, Default)]
struct WireState {
    now_ns: u64,
    host_low_since: Option<u64>,
    frame: Frame,
    fault: SimFault,
    waveform: Option<Waveform>,
    requests: u32,
}

impl WireState {
    fn release(&mut self) {
        let Some(since) = self.host_low_since.take() else {
            return;
        };
        if self.now_ns.saturating_sub(since) < MIN_START_NS {
            return;
        }
        self.requests += 1;
        if self.fault == SimFault::NoResponse {
            return;
        }

        let mut frame = self.frame;
        if self.fault == SimFault::CorruptChecksum {
            frame[4] = frame[4].wrapping_add(1);
        }

        let mut segments = vec![
            (true, RESPONSE_LATENCY_US),
            (false, RESPONSE_LOW_US),
            (true, RESPONSE_HIGH_US),
        ];
        for bit in 0..40u8 {
            if self.fault == SimFault::StallAtBit(bit) {
                segments.push((false, FOREVER_US));
                break;
            }
            let set = frame[usize::from(bit / 8)] & (0x80 >> (bit % 8)) != 0;
            segments.push((false, BIT_LOW_US));
            segments.push((true, if set { ONE_HIGH_US } else { ZERO_HIGH_US }));
        }
        segments.push((false, BIT_LOW_US));

        self.waveform = Some(Waveform {
            start_ns: self.now_ns,
            segments,
        });
    }

    fn level(&self) -> bool {
        if self.host_low_since.is_some() {
            return false;
        }
        self.waveform.as_ref().is_none_or(|w| w.level_at(self.now_ns))
    }
}

// ── Handle ───────────────────────────────────────────────────

/// Programmable sensor.  Clone freely; every clone drives the same wire.
#[derive(Debug, Clone)]
pub struct SimWire {
    state: Arc<Mutex<WireState>>,
}

impl SimWire {
    pub fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        let state = WireState {
            frame: encode_frame(temperature_c, humidity_pct),
            ..WireState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WireState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pin and delay halves for the decoder.
    pub fn split(&self) -> (SimLine, SimDelay) {
        (
            SimLine {
                wire: self.clone(),
            },
            SimDelay {
                wire: self.clone(),
            },
        )
    }

    pub fn set_reading(&self, temperature_c: f32, humidity_pct: f32) {
        self.lock().frame = encode_frame(temperature_c, humidity_pct);
    }

    /// Send an arbitrary raw frame, checksum included.
    pub fn set_frame(&self, frame: Frame) {
        self.lock().frame = frame;
    }

    pub fn set_fault(&self, fault: SimFault) {
        self.lock().fault = fault;
    }

    /// Start pulses long enough to wake the sensor.
    pub fn requests_seen(&self) -> u32 {
        self.lock().requests
    }

    /// The host is not driving the line low.
    pub fn line_is_idle(&self) -> bool {
        self.lock().host_low_since.is_none()
    }
}

// ── embedded-hal halves ──────────────────────────────────────

pub struct SimLine {
    wire: SimWire,
}

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut s = self.wire.lock();
        if s.host_low_since.is_none() {
            s.host_low_since = Some(s.now_ns);
            s.waveform = None;
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.wire.lock().release();
        Ok(())
    }
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.wire.lock().level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.wire.lock().level())
    }
}

pub struct SimDelay {
    wire: SimWire,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut s = self.wire.lock();
        s.now_ns = s.now_ns.saturating_add(u64::from(ns));
    }
}
