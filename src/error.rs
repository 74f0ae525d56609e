//! Unified error types for the TempWatch firmware.
//!
//! Every subsystem error converts into the top-level [`Error`], keeping the
//! task loops' error handling uniform.  All variants are `Copy` so they can
//! be logged, counted by the sample-health tracker and returned from the
//! cycle without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The single-wire sensor read failed.
    Decode(DecodeError),
    /// A sample cycle or sink push could not complete.
    Pipeline(PipelineError),
    /// A coordination primitive or peripheral could not be set up.
    Init(InitError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Pipeline(e) => write!(f, "pipeline: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Which wait-for-transition step of the sensor handshake ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    /// Sensor never pulled the line low after the start pulse.
    ResponseLow,
    /// Sensor never released its 80 µs response low.
    ResponseHigh,
    /// Sensor never pulled low to open the data phase.
    DataStart,
    /// The ~50 µs bit-start low of bit `n` never ended.
    BitStart(u8),
    /// The data high pulse of bit `n` never ended.
    BitEnd(u8),
}

impl fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseLow => write!(f, "response low"),
            Self::ResponseHigh => write!(f, "response high"),
            Self::DataStart => write!(f, "data start"),
            Self::BitStart(n) => write!(f, "bit {n} start"),
            Self::BitEnd(n) => write!(f, "bit {n} end"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A handshake or bit transition exceeded its timeout.
    Timeout(TimeoutStage),
    /// `(b0 + b1 + b2 + b3) mod 256 != b4`.
    ChecksumMismatch,
    /// Decoded values are NaN or outside -40..=80 °C / 0..=100 %RH.
    OutOfRange,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(stage) => write!(f, "timeout waiting for {stage}"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Recoverable per-cycle failures.  Never fatal: the cycle is skipped or
/// the push is dropped, and the next periodic trigger carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// The shared bus could not be acquired within its bounded wait.
    BusContention,
    /// A display or telemetry sink could not accept a push right now.
    SinkUnavailable,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusContention => write!(f, "bus contention"),
            Self::SinkUnavailable => write!(f, "sink unavailable"),
        }
    }
}

impl From<PipelineError> for Error {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

// ---------------------------------------------------------------------------
// Init errors
// ---------------------------------------------------------------------------

/// Resource classes the pipeline needs before any task may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    BusLock,
    Notification,
    HandOff,
    Timer,
    Task,
    Gpio,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusLock => write!(f, "bus lock"),
            Self::Notification => write!(f, "notification"),
            Self::HandOff => write!(f, "display hand-off"),
            Self::Timer => write!(f, "timer"),
            Self::Task => write!(f, "task"),
            Self::Gpio => write!(f, "GPIO"),
        }
    }
}

/// Startup failures are fatal: a half-initialised pipeline cannot safely
/// arbitrate the shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    ResourceAllocationFailed(ResourceKind),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceAllocationFailed(kind) => {
                write!(f, "failed to allocate {kind}")
            }
        }
    }
}

impl std::error::Error for InitError {}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
