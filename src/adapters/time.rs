//! Monotonic uptime clock.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.

#[derive(Debug, Clone, Copy)]
pub struct Uptime {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Uptime {
    fn default() -> Self {
        Self::new()
    }
}

impl Uptime {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: process_start(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads a free-running counter; no
        // preconditions beyond the timer service, which IDF starts before main.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since boot (monotonic).
    pub fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }
}

/// All host clocks share one origin so timestamps from different tasks
/// compare like the single ESP timer does.
#[cfg(not(target_os = "espidf"))]
fn process_start() -> std::time::Instant {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    *START.get_or_init(std::time::Instant::now)
}
