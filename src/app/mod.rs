//! Application core: the temperature-watch domain.
//!
//! Classification, the shared state register, the coordination pipeline
//! and the alert reactor.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer testable
//! without real peripherals.

pub mod alert;
pub mod health;
pub mod pipeline;
pub mod ports;
pub mod register;
pub mod state;
pub mod tasks;
