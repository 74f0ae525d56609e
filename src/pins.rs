//! GPIO / peripheral pin assignments for the monitor board.
//!
//! Single source of truth: drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// DHT22 temperature / humidity sensor
// ---------------------------------------------------------------------------

/// Single-wire data line.  Open-drain with the external 10 kΩ pull-up.
/// `main` takes the typed `gpio4` peripheral and asserts it matches.
pub const DHT_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Alarm outputs
// ---------------------------------------------------------------------------

/// Active buzzer, HIGH = sounding.
pub const BUZZER_GPIO: i32 = 5;
/// Alarm indicator LED, HIGH = lit.
pub const LED_GPIO: i32 = 2;
