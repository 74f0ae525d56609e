//! Prioritised thread spawning for the pipeline tasks.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task with an explicit priority, stack size and (optionally)
//! core affinity. On non-ESP targets, falls back to plain thread spawn.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread. This means the config→spawn pair must not be
//! interleaved with other thread creation on the same thread.

use crate::error::{InitError, ResourceKind};

/// Sampler outranks rendering, rendering outranks the alarm logic, so
/// bus-critical decoding is never starved.
pub const SAMPLER_PRIORITY: u8 = 5;
pub const DISPLAY_PRIORITY: u8 = 4;
pub const ALERT_PRIORITY: u8 = 3;

/// Host threads format floats through `std` and need more room than the
/// firmware budgets.
#[cfg(not(target_os = "espidf"))]
const HOST_MIN_STACK: usize = 256 * 1024;

/// Core placement for a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Core {
    /// Let the scheduler pick (required on single-core parts).
    Any,
    /// Core 0 (PRO_CPU).
    Pro,
    /// Core 1 (APP_CPU).
    App,
}

/// Spawn a thread with explicit priority, stack size and core placement.
///
/// The `name` parameter must be a null-terminated string (e.g. `"sampler\0"`).
/// A failed spawn is reported as [`ResourceKind::Task`] so startup can
/// abort before the pipeline runs half-built.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>, InitError> {
    // SAFETY: the config struct is fully initialised by the IDF default
    // constructor and `name` is 'static and NUL-terminated.
    let ret = unsafe {
        let mut cfg = esp_idf_svc::sys::esp_create_default_pthread_config();
        match core {
            Core::Any => {}
            Core::Pro => cfg.pin_to_core = 0,
            Core::App => cfg.pin_to_core = 1,
        }
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr() as *const _;
        esp_idf_svc::sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_svc::sys::ESP_OK as i32 {
        log::error!("esp_pthread_set_cfg failed for '{}': {}", name, ret);
        return Err(InitError::ResourceAllocationFailed(ResourceKind::Task));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .map_err(|e| {
            log::error!("Thread '{}' spawn failed: {}", display_name, e);
            InitError::ResourceAllocationFailed(ResourceKind::Task)
        })
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>, InitError> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no priority, stack={}KB)",
        display_name,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size((stack_kb * 1024).max(HOST_MIN_STACK))
        .spawn(f)
        .map_err(|e| {
            log::error!("Thread '{}' spawn failed: {}", display_name, e);
            InitError::ResourceAllocationFailed(ResourceKind::Task)
        })
}
