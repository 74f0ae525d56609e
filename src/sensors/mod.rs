//! Sensor subsystem.
//!
//! [`dht22`] is the single-wire protocol decoder; [`sim`] stands in for the
//! physical wire on host builds so the full pipeline runs without hardware.

pub mod dht22;
#[cfg(not(target_os = "espidf"))]
pub mod sim;

pub use dht22::Dht22;
