//! One-shot GPIO initialization for the alarm outputs.
//!
//! Configures the buzzer and indicator pins with raw ESP-IDF sys calls and
//! drives both LOW.  Called once from `main()` before the tasks start.
//! The sensor line is owned by its `PinDriver` and is not touched here.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::error::InitError;
#[cfg(target_os = "espidf")]
use crate::error::ResourceKind;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_alarm_gpio() -> Result<(), InitError> {
    for pin in [pins::BUZZER_GPIO, pins::LED_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: called once from main() before any task runs.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            log::error!("hw_init: GPIO{} config failed (rc={})", pin, ret);
            return Err(InitError::ResourceAllocationFailed(ResourceKind::Gpio));
        }
        // SAFETY: pin was configured as an output just above.
        unsafe { gpio_set_level(pin, 0) };
    }
    log::info!(
        "hw_init: alarm outputs configured (buzzer=GPIO{}, led=GPIO{})",
        pins::BUZZER_GPIO,
        pins::LED_GPIO
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_alarm_gpio() -> Result<(), InitError> {
    log::info!("hw_init(sim): alarm GPIO init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an output configured in
    // init_alarm_gpio(); only the alert task calls this.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}
