//! Compile session state machine
//!
//! Session states: IDLE → SUBMITTED → POLLING → {SUCCEEDED | FAILED}

mod session_state;

pub use session_state::{SessionState, SessionStateError};

/// Check if a state is terminal (no further transitions possible)
pub trait TerminalState {
    fn is_terminal(&self) -> bool;
}
