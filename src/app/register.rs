//! Shared state register: the current [`SystemState`] plus the new-data edge.
//!
//! Both live in one cell behind a critical-section mutex, so "replace the
//! state, then raise the edge" is a single atomic step.  No reader can see a
//! new state without its edge, or two states at once.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::state::SystemState;

#[derive(Debug, Clone, Copy, Default)]
struct Cells {
    state: SystemState,
    new_data: bool,
}

pub struct StateRegister {
    cells: Mutex<CriticalSectionRawMutex, Cell<Cells>>,
}

impl Default for StateRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRegister {
    pub const fn new() -> Self {
        Self {
            cells: Mutex::new(Cell::new(Cells {
                state: SystemState::Normal,
                new_data: false,
            })),
        }
    }

    /// Replace the state and raise the edge.  Returns the previous state.
    pub fn publish(&self, state: SystemState) -> SystemState {
        self.cells.lock(|c| {
            let prev = c.get().state;
            c.set(Cells {
                state,
                new_data: true,
            });
            prev
        })
    }

    /// Current state, without touching the edge.
    pub fn current(&self) -> SystemState {
        self.cells.lock(|c| c.get().state)
    }

    /// Consume the edge.  `Some(state)` at most once per publish.
    pub fn take_edge(&self) -> Option<SystemState> {
        self.cells.lock(|c| {
            let cells = c.get();
            if cells.new_data {
                c.set(Cells {
                    new_data: false,
                    ..cells
                });
                Some(cells.state)
            } else {
                None
            }
        })
    }

    pub fn has_edge(&self) -> bool {
        self.cells.lock(|c| c.get().new_data)
    }
}
