//! Buzzer + indicator LED driver.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives two plain GPIO outputs via hw_init.
//! On host/test: tracks state in-memory only.

use crate::app::ports::AlarmPort;
use crate::drivers::hw_init;
use crate::pins;

pub struct AlarmOutputs {
    sounder: bool,
    indicator: bool,
}

impl AlarmOutputs {
    pub fn new() -> Self {
        Self {
            sounder: false,
            indicator: false,
        }
    }

    pub fn sounder(&self) -> bool {
        self.sounder
    }

    pub fn indicator(&self) -> bool {
        self.indicator
    }
}

impl Default for AlarmOutputs {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmPort for AlarmOutputs {
    fn set_sounder(&mut self, on: bool) {
        hw_init::gpio_write(pins::BUZZER_GPIO, on);
        self.sounder = on;
    }

    fn set_indicator(&mut self, on: bool) {
        hw_init::gpio_write(pins::LED_GPIO, on);
        self.indicator = on;
    }
}
