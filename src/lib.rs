//! Temperature-watch firmware library.
//!
//! Exposes the pipeline, decoder and adapters for the binary and for
//! integration testing. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod sensors;

pub use app::pipeline::Pipeline;
pub use app::state::{Reading, SystemState};
pub use config::{SharedConfig, SystemConfig};
pub use error::{DecodeError, Error, PipelineError};
