//! DHT22 (AM2302) single-wire temperature/humidity decoder.
//!
//! The line is open-drain with a pull-up: "released" and "driven high" are
//! the same electrical state, so `set_high()` both releases the line and
//! returns it to idle.
//!
//! ```text
//!  host  ──┐ ≥18 ms ┌─30µs─┐
//!          └────────┘      │ sensor ┌ 80µs ┐
//!                          └────────┘      └─┐ 50µs ┌ 26-28µs (0) / 70µs (1) ┐
//!                                            └──────┘                        └ … ×40
//! ```
//!
//! Frame layout (MSB first): `[hum_hi, hum_lo, temp_hi, temp_lo, checksum]`.
//! Both values are ×10 fixed point; bit 15 of the temperature word is a
//! sign flag over a magnitude, not two's complement.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` 1.0 pin and delay traits.
//! On ESP-IDF: an open-drain `PinDriver` plus `esp_idf_hal::delay::Delay`,
//! which yields to FreeRTOS for the millisecond start pulse and busy-waits
//! on `Ets` for the microsecond polling.
//! On host/test: [`SimWire`](super::sim::SimWire) replays a waveform on a
//! virtual clock.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::adapters::time::Uptime;
use crate::app::ports::SensorPort;
use crate::app::state::Reading;
use crate::error::{DecodeError, TimeoutStage};

/// Host start pulse.  The datasheet minimum is 18 ms.
pub const START_LOW_MS: u32 = 20;
/// Settling time after release before sampling the response.
pub const RELEASE_WAIT_US: u32 = 30;
/// Upper bound for each response-phase transition.
pub const RESPONSE_TIMEOUT_US: u32 = 100;
/// Upper bound for each bit-phase transition.
pub const BIT_TIMEOUT_US: u32 = 100;
/// High pulses longer than this decode as 1.
pub const BIT_THRESHOLD_US: u32 = 40;

pub const FRAME_BITS: usize = 40;

/// Raw 5-byte sensor frame.
pub type Frame = [u8; 5];

pub const TEMP_MIN_C: f32 = -40.0;
pub const TEMP_MAX_C: f32 = 80.0;
pub const HUMIDITY_MIN_PCT: f32 = 0.0;
pub const HUMIDITY_MAX_PCT: f32 = 100.0;

const SIGN_BIT: u16 = 0x8000;

// ── Pure frame codec ─────────────────────────────────────────

/// Additive checksum over the four data bytes, modulo 256.
pub fn checksum(frame: &Frame) -> u8 {
    frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Validate and convert a raw frame to `(temperature_c, humidity_pct)`.
///
/// Checksum is checked before range, so a corrupted frame never reports
/// `OutOfRange`.
pub fn decode_frame(frame: &Frame) -> Result<(f32, f32), DecodeError> {
    if checksum(frame) != frame[4] {
        return Err(DecodeError::ChecksumMismatch);
    }

    let hum_raw = u16::from_be_bytes([frame[0], frame[1]]);
    let temp_raw = u16::from_be_bytes([frame[2], frame[3]]);

    let humidity = f32::from(hum_raw) / 10.0;
    let magnitude = f32::from(temp_raw & !SIGN_BIT) / 10.0;
    let temperature = if temp_raw & SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    };

    if !in_range(temperature, humidity) {
        return Err(DecodeError::OutOfRange);
    }
    Ok((temperature, humidity))
}

/// True when both values are finite and inside the sensor's operating range.
pub fn in_range(temperature_c: f32, humidity_pct: f32) -> bool {
    temperature_c.is_finite()
        && humidity_pct.is_finite()
        && (TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature_c)
        && (HUMIDITY_MIN_PCT..=HUMIDITY_MAX_PCT).contains(&humidity_pct)
}

/// Build the frame a sensor would send for the given values, rounded to
/// the 0.1 resolution of the wire format.
pub fn encode_frame(temperature_c: f32, humidity_pct: f32) -> Frame {
    let hum_raw = (humidity_pct * 10.0).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    let temp_mag = (temperature_c.abs() * 10.0).round().clamp(0.0, f32::from(!SIGN_BIT)) as u16;
    let temp_raw = if temperature_c < 0.0 && temp_mag != 0 {
        temp_mag | SIGN_BIT
    } else {
        temp_mag
    };

    let [h_hi, h_lo] = hum_raw.to_be_bytes();
    let [t_hi, t_lo] = temp_raw.to_be_bytes();
    let mut frame = [h_hi, h_lo, t_hi, t_lo, 0];
    frame[4] = checksum(&frame);
    frame
}

/// Pack measured high-pulse widths (µs) into a frame, MSB first.
/// Widths beyond the first 40 are ignored; missing ones count as 0 bits.
pub fn pack_bits<I>(high_widths_us: I) -> Frame
where
    I: IntoIterator<Item = u32>,
{
    let mut frame = [0u8; 5];
    for (i, width) in high_widths_us.into_iter().take(FRAME_BITS).enumerate() {
        if width > BIT_THRESHOLD_US {
            frame[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    frame
}

// ── Line guard ───────────────────────────────────────────────

/// Releases the line (idle high) when dropped, on every exit path.
struct Released<'a, P: OutputPin>(&'a mut P);

impl<P: OutputPin> Drop for Released<'_, P> {
    fn drop(&mut self) {
        let _ = self.0.set_high();
    }
}

/// Poll until the line reads `high`, one microsecond per poll.
/// Returns the number of polls spent waiting.
fn wait_for_level<P, D>(
    pin: &mut P,
    delay: &mut D,
    high: bool,
    timeout_us: u32,
    stage: TimeoutStage,
) -> Result<u32, DecodeError>
where
    P: InputPin,
    D: DelayNs,
{
    let mut elapsed = 0u32;
    loop {
        // A pin that cannot be read is indistinguishable from a silent sensor.
        if pin.is_high().map_err(|_| DecodeError::Timeout(stage))? == high {
            return Ok(elapsed);
        }
        if elapsed > timeout_us {
            return Err(DecodeError::Timeout(stage));
        }
        delay.delay_us(1);
        elapsed += 1;
    }
}

// ── Driver ───────────────────────────────────────────────────

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
    clock: Uptime,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Take ownership of the (open-drain, pulled-up) data pin and leave it idle.
    pub fn new(mut pin: P, delay: D) -> Self {
        if pin.set_high().is_err() {
            warn!("DHT22: could not release the data line at init");
        }
        Self {
            pin,
            delay,
            clock: Uptime::new(),
        }
    }

    /// Run one start/response/40-bit exchange and return the raw frame.
    /// The frame is not yet checksum-verified.
    pub fn read_frame(&mut self) -> Result<Frame, DecodeError> {
        let Self { pin, delay, .. } = self;
        let mut line = Released(pin);

        // Start pulse.  A pin that cannot be driven never wakes the sensor.
        line.0
            .set_low()
            .map_err(|_| DecodeError::Timeout(TimeoutStage::ResponseLow))?;
        delay.delay_ms(START_LOW_MS);
        line.0
            .set_high()
            .map_err(|_| DecodeError::Timeout(TimeoutStage::ResponseLow))?;
        delay.delay_us(RELEASE_WAIT_US);

        // Response: low, high, then the low that opens bit 0.
        wait_for_level(&mut *line.0, delay, false, RESPONSE_TIMEOUT_US, TimeoutStage::ResponseLow)?;
        wait_for_level(&mut *line.0, delay, true, RESPONSE_TIMEOUT_US, TimeoutStage::ResponseHigh)?;
        wait_for_level(&mut *line.0, delay, false, RESPONSE_TIMEOUT_US, TimeoutStage::DataStart)?;

        let mut widths = [0u32; FRAME_BITS];
        for (i, width) in widths.iter_mut().enumerate() {
            let bit = i as u8;
            wait_for_level(&mut *line.0, delay, true, BIT_TIMEOUT_US, TimeoutStage::BitStart(bit))?;
            *width = wait_for_level(&mut *line.0, delay, false, BIT_TIMEOUT_US, TimeoutStage::BitEnd(bit))?;
        }

        drop(line);
        Ok(pack_bits(widths))
    }
}

impl<P, D> SensorPort for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<Reading, DecodeError> {
        let frame = self.read_frame()?;
        let (temperature, humidity) = decode_frame(&frame)?;
        debug!("DHT22 read: T={:.1}C H={:.1}%", temperature, humidity);
        Ok(Reading::new(temperature, humidity, self.clock.uptime_ms()))
    }
}
