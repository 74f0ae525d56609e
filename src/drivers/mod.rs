//! Output drivers, hardware initialisation, and task spawning.

pub mod alarm;
pub mod hw_init;
pub mod task_pin;
