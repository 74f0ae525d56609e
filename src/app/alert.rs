//! Alert reactor: drives the sounder and the status indicator from the
//! current [`SystemState`].
//!
//! ```text
//!                 Overheat edge (sounder idle)
//!   IdleNormal ────────────────────────────────▶ Sounding
//!   IdleWarning ───────────────────────────────▶    │
//!        ▲  ▲                                      │ auto-silence expiry
//!        │  │ Normal / Warning edge                ▼
//!        │  └──────────────────────────────── SilencedOverheat
//!        │                                         │ Overheat edge
//!        └── Normal / Error edge                   └──────▶ Sounding
//! ```
//!
//! Every edge re-reads the *current* state; the reactor never replays the
//! history of edges.  While Overheat persists the sounder cycles: on for
//! the auto-silence duration, off until the next sample edge, on again.
//!
//! The reactor is pure: time is passed in as `now_ms`, and the runtime
//! loop in [`pipeline`](super::pipeline) decides when to call it.

use log::{debug, info, warn};

use super::ports::AlarmPort;
use super::state::SystemState;

/// Phase of the alert state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertPhase {
    #[default]
    IdleNormal,
    IdleWarning,
    Sounding,
    SilencedOverheat,
}

/// Alarm settings re-read from the live config on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSettings {
    pub enabled: bool,
    pub duration_ms: u32,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 10_000,
        }
    }
}

// ── Auto-silence timer ───────────────────────────────────────

/// One-shot deadline.  The runtime sleeps until [`deadline_ms`](Self::deadline_ms)
/// and then posts expiry back to the reactor; no work runs in timer context.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSilence {
    deadline_ms: Option<u64>,
}

impl AutoSilence {
    pub fn start(&mut self, now_ms: u64, duration_ms: u32) {
        self.deadline_ms = Some(now_ms.saturating_add(u64::from(duration_ms)));
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|d| now_ms >= d)
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }
}

// ── Reactor ──────────────────────────────────────────────────

pub struct AlertReactor<A: AlarmPort> {
    outputs: A,
    phase: AlertPhase,
    silence: AutoSilence,
    last_state: Option<SystemState>,
    sounder_on: bool,
    indicator_on: bool,
}

impl<A: AlarmPort> AlertReactor<A> {
    /// Start with both outputs off.
    pub fn new(mut outputs: A) -> Self {
        outputs.set_sounder(false);
        outputs.set_indicator(false);
        Self {
            outputs,
            phase: AlertPhase::IdleNormal,
            silence: AutoSilence::default(),
            last_state: None,
            sounder_on: false,
            indicator_on: false,
        }
    }

    /// React to one new-data edge carrying the current state.
    pub fn on_edge(&mut self, state: SystemState, now_ms: u64, settings: AlarmSettings) {
        // An overdue expiry is applied first so the sounder re-arms below.
        self.on_silence_expired(now_ms);

        let prev_phase = self.phase;
        match state {
            SystemState::Overheat => self.enter_overheat(now_ms, settings),
            SystemState::Warning => {
                self.sounder(false);
                self.indicator(true);
                self.silence.cancel();
                self.phase = AlertPhase::IdleWarning;
            }
            SystemState::Normal => {
                self.sounder(false);
                self.indicator(false);
                self.silence.cancel();
                self.phase = AlertPhase::IdleNormal;
            }
            SystemState::Error => {
                // No alarm without a trusted reading.
                self.sounder(false);
                self.indicator(false);
                self.silence.cancel();
                self.phase = AlertPhase::IdleNormal;
            }
        }

        if prev_phase != self.phase {
            info!("ALERT | {:?} -> {:?} (state={})", prev_phase, self.phase, state);
        }
        self.last_state = Some(state);
    }

    /// Apply auto-silence expiry if the deadline has passed.  Returns `true`
    /// if the sounder was silenced by this call.
    pub fn on_silence_expired(&mut self, now_ms: u64) -> bool {
        if !self.silence.expired(now_ms) {
            return false;
        }
        self.silence.cancel();
        self.sounder(false);
        if self.phase == AlertPhase::Sounding {
            self.phase = AlertPhase::SilencedOverheat;
        }
        info!("ALERT | auto-silence expired, sounder off");
        true
    }

    fn enter_overheat(&mut self, now_ms: u64, settings: AlarmSettings) {
        self.indicator(true);

        if !settings.enabled {
            if self.sounder_on {
                warn!("ALERT | alarm disabled, silencing sounder");
            }
            self.sounder(false);
            self.silence.cancel();
            self.phase = AlertPhase::SilencedOverheat;
            return;
        }

        if self.silence.is_running() {
            debug!("ALERT | sounder already active, no re-trigger");
            return;
        }

        self.sounder(true);
        self.silence.start(now_ms, settings.duration_ms);
        self.phase = AlertPhase::Sounding;

        if self.last_state == Some(SystemState::Overheat) {
            warn!(
                "ALERT | overheat persists, repeat cycle ({}ms)",
                settings.duration_ms
            );
        } else {
            warn!(
                "ALERT | overheat entered, sounder on for {}ms",
                settings.duration_ms
            );
        }
    }

    fn sounder(&mut self, on: bool) {
        self.outputs.set_sounder(on);
        self.sounder_on = on;
    }

    fn indicator(&mut self, on: bool) {
        self.outputs.set_indicator(on);
        self.indicator_on = on;
    }

    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    pub fn sounder_on(&self) -> bool {
        self.sounder_on
    }

    pub fn indicator_on(&self) -> bool {
        self.indicator_on
    }

    /// Pending auto-silence deadline, if the sounder is timed.
    pub fn silence_deadline_ms(&self) -> Option<u64> {
        self.silence.deadline_ms()
    }

    pub fn outputs(&self) -> &A {
        &self.outputs
    }
}
