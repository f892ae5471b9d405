//! Update Gate - single-flight scheduling for update passes.
//!
//! ```text
//! Idle --request--> Running --finish--> Idle
//!                    |    ^
//!             request|    |finish (runs again)
//!                    v    |
//!                   Pending
//! ```
//!
//! Any number of requests while a pass runs collapse into one follow-up pass.

use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GateState {
    #[default]
    Idle,
    Running,
    /// Running, with another pass requested.
    Pending,
}

/// Allows one pass in flight and remembers whether another is owed.
#[derive(Debug, Default)]
pub struct UpdateGate {
    state: Cell<GateState>,
}

impl UpdateGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a pass. Returns true if the caller should start one now.
    pub fn request(&self) -> bool {
        match self.state.get() {
            GateState::Idle => {
                self.state.set(GateState::Running);
                true
            }
            GateState::Running | GateState::Pending => {
                self.state.set(GateState::Pending);
                false
            }
        }
    }

    /// Report the running pass done. Returns true if the caller should run
    /// one more pass.
    pub fn finish(&self) -> bool {
        match self.state.get() {
            GateState::Pending => {
                self.state.set(GateState::Running);
                true
            }
            GateState::Running | GateState::Idle => {
                self.state.set(GateState::Idle);
                false
            }
        }
    }

    /// Drop any running or pending pass.
    pub fn reset(&self) {
        self.state.set(GateState::Idle);
    }

    pub fn is_busy(&self) -> bool {
        self.state.get() != GateState::Idle
    }
}
