//! Task wiring: three threads, one shared [`Pipeline`].
//!
//! | Task    | Priority | Drives                                        |
//! |---------|----------|-----------------------------------------------|
//! | sampler | 5        | `LocalExecutor`: ticker + sampling futures   |
//! | display | 4        | data-ready → hand-off → panel                 |
//! | alert   | 3        | edge → [`AlertReactor`]                       |
//!
//! Threads are created parked behind a start gate.  The gate opens only
//! after every spawn succeeded; on a failed spawn it is closed and the
//! already-created threads exit without touching the bus.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;

use log::{error, info};

use crate::drivers::task_pin::{self, ALERT_PRIORITY, Core, DISPLAY_PRIORITY, SAMPLER_PRIORITY};
use crate::error::InitError;

use super::alert::AlertReactor;
use super::pipeline::Pipeline;
use super::ports::{AlarmPort, DisplaySink, SensorPort, TelemetrySink};

const SAMPLER_STACK_KB: usize = 8;
const DISPLAY_STACK_KB: usize = 6;
const ALERT_STACK_KB: usize = 6;

/// One-shot go/no-go latch shared by the freshly spawned tasks.
#[derive(Default)]
struct StartGate {
    decision: Mutex<Option<bool>>,
    cv: Condvar,
}

impl StartGate {
    fn wait(&self) -> bool {
        let mut d = self.decision.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(go) = *d {
                return go;
            }
            d = self.cv.wait(d).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn release(&self, go: bool) {
        *self.decision.lock().unwrap_or_else(PoisonError::into_inner) = Some(go);
        self.cv.notify_all();
    }
}

pub struct TaskHandles {
    pub sampler: JoinHandle<()>,
    pub display: JoinHandle<()>,
    pub alert: JoinHandle<()>,
}

/// Spawn the sampler, display and alert tasks.  Nothing runs until all
/// three exist.
pub fn spawn_pipeline<S, D, T, A>(
    pipeline: &Arc<Pipeline<S, D, T>>,
    reactor: AlertReactor<A>,
) -> Result<TaskHandles, InitError>
where
    S: SensorPort + Send + 'static,
    D: DisplaySink + Send + 'static,
    T: TelemetrySink + Send + Sync + 'static,
    A: AlarmPort + Send + 'static,
{
    let gate = Arc::new(StartGate::default());

    let result = spawn_all(pipeline, reactor, &gate);
    match &result {
        Ok(_) => {
            info!("Pipeline tasks spawned, releasing start gate");
            gate.release(true);
        }
        Err(e) => {
            error!("Pipeline start aborted: {}", e);
            gate.release(false);
        }
    }
    result
}

fn spawn_all<S, D, T, A>(
    pipeline: &Arc<Pipeline<S, D, T>>,
    mut reactor: AlertReactor<A>,
    gate: &Arc<StartGate>,
) -> Result<TaskHandles, InitError>
where
    S: SensorPort + Send + 'static,
    D: DisplaySink + Send + 'static,
    T: TelemetrySink + Send + Sync + 'static,
    A: AlarmPort + Send + 'static,
{
    let sampler = {
        let ctx = Arc::clone(pipeline);
        let gate = Arc::clone(gate);
        task_pin::spawn_on_core(Core::Any, SAMPLER_PRIORITY, SAMPLER_STACK_KB, "sampler\0", move || {
            if !gate.wait() {
                return;
            }
            let ctx = &*ctx;
            let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
            executor.spawn(ctx.tick_loop()).detach();
            futures_lite::future::block_on(executor.run(ctx.sample_loop()));
        })?
    };

    let display = {
        let ctx = Arc::clone(pipeline);
        let gate = Arc::clone(gate);
        task_pin::spawn_on_core(Core::Any, DISPLAY_PRIORITY, DISPLAY_STACK_KB, "display\0", move || {
            if !gate.wait() {
                return;
            }
            futures_lite::future::block_on(ctx.display_loop());
        })?
    };

    let alert = {
        let ctx = Arc::clone(pipeline);
        let gate = Arc::clone(gate);
        task_pin::spawn_on_core(Core::Any, ALERT_PRIORITY, ALERT_STACK_KB, "alert\0", move || {
            if !gate.wait() {
                return;
            }
            futures_lite::future::block_on(ctx.alert_loop(&mut reactor));
        })?
    };

    Ok(TaskHandles {
        sampler,
        display,
        alert,
    })
}
