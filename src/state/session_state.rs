//! Session state machine
//!
//! Session states: IDLE → SUBMITTED → POLLING → {SUCCEEDED | FAILED}.
//! A submitted task may complete on its first poll, so SUBMITTED can move
//! straight to a terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TerminalState;

/// Session state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Nothing submitted yet
    Idle,
    /// The service accepted the build and assigned a task id
    Submitted,
    /// At least one poll reported the task still running
    Polling,
    /// The build completed without errors
    Succeeded,
    /// The build completed with at least one error
    Failed,
}

impl TerminalState for SessionState {
    fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Failed)
    }
}

impl SessionState {
    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        match (self, target) {
            (SessionState::Idle, SessionState::Submitted) => true,

            (SessionState::Submitted, SessionState::Polling) => true,
            (SessionState::Submitted, SessionState::Succeeded) => true,
            (SessionState::Submitted, SessionState::Failed) => true,

            (SessionState::Polling, SessionState::Polling) => true,
            (SessionState::Polling, SessionState::Succeeded) => true,
            (SessionState::Polling, SessionState::Failed) => true,

            // Terminal states cannot transition
            _ => false,
        }
    }

    /// Validate and return the target state.
    pub fn transition(&self, target: SessionState) -> Result<SessionState, SessionStateError> {
        if self.is_terminal() {
            return Err(SessionStateError::TerminalState(*self));
        }
        if !self.can_transition_to(target) {
            return Err(SessionStateError::InvalidTransition { from: *self, to: target });
        }
        Ok(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Submitted => "SUBMITTED",
            SessionState::Polling => "POLLING",
            SessionState::Succeeded => "SUCCEEDED",
            SessionState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for session state operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStateError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("Session is in terminal state {0}")]
    TerminalState(SessionState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let s = SessionState::Idle;
        let s = s.transition(SessionState::Submitted).unwrap();
        let s = s.transition(SessionState::Polling).unwrap();
        let s = s.transition(SessionState::Polling).unwrap();
        let s = s.transition(SessionState::Succeeded).unwrap();
        assert!(s.is_terminal());
    }

    #[test]
    fn test_complete_on_first_poll() {
        assert!(SessionState::Submitted.can_transition_to(SessionState::Failed));
        assert!(SessionState::Submitted.can_transition_to(SessionState::Succeeded));
    }

    #[test]
    fn test_idle_cannot_poll() {
        assert_eq!(
            SessionState::Idle.transition(SessionState::Polling),
            Err(SessionStateError::InvalidTransition {
                from: SessionState::Idle,
                to: SessionState::Polling
            })
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [SessionState::Succeeded, SessionState::Failed] {
            for target in [
                SessionState::Idle,
                SessionState::Submitted,
                SessionState::Polling,
                SessionState::Succeeded,
                SessionState::Failed,
            ] {
                assert!(!terminal.can_transition_to(target));
                assert_eq!(
                    terminal.transition(target),
                    Err(SessionStateError::TerminalState(terminal))
                );
            }
        }
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&SessionState::Succeeded).unwrap(), "\"SUCCEEDED\"");
    }
}
