//! Bounded polling for the compile session
//!
//! The session never waits on its own. The caller polls through a
//! [`PollBudget`]: at most `max_attempts` polls with a fixed interval
//! between them, stopping as soon as the session reaches a terminal state.
//! Running out of attempts is reported as [`PollError::Timeout`].

use std::thread::sleep;
use std::time::Duration;

use tracing::{debug, warn};

use rcc_protocol::Diagnostic;

use crate::host::{CompileSession, SessionError};
use crate::state::{SessionState, TerminalState};

/// Upper bound on `max_attempts`
pub const MAX_POLL_ATTEMPTS: u32 = 1000;

/// Upper bound on the poll interval, in seconds
pub const MAX_POLL_INTERVAL_SECONDS: u64 = 60;

/// Poll budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    /// Maximum number of output polls (default: 50)
    pub max_attempts: u32,

    /// Wait between polls (default: 2s)
    pub interval: Duration,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            interval: Duration::from_secs(2),
        }
    }
}

impl PollBudget {
    /// Create a PollBudget from config values
    pub fn from_config(attempts: Option<u32>, interval_seconds: Option<u64>) -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: attempts.unwrap_or(defaults.max_attempts),
            interval: interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
        }
    }

    /// Validate the budget bounds
    pub fn validate(&self) -> Result<(), PollBudgetError> {
        // max_attempts must be in [1, 1000]
        if self.max_attempts == 0 || self.max_attempts > MAX_POLL_ATTEMPTS {
            return Err(PollBudgetError::AttemptsOutOfBounds {
                value: self.max_attempts,
            });
        }

        if self.interval > Duration::from_secs(MAX_POLL_INTERVAL_SECONDS) {
            return Err(PollBudgetError::IntervalOutOfBounds {
                value: self.interval.as_secs(),
            });
        }

        Ok(())
    }

    /// Poll `session` until it is terminal or the budget runs out.
    ///
    /// `on_batch` sees the messages of every poll, including the final
    /// batch of a build that fails with `CompileFailure`.
    pub fn drive<F>(&self, session: &mut CompileSession, mut on_batch: F) -> Result<SessionState, PollError>
    where
        F: FnMut(&[Diagnostic]),
    {
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                sleep(self.interval);
            }

            let state = match session.poll() {
                Ok(state) => state,
                Err(e @ SessionError::CompileFailure { .. }) => {
                    on_batch(session.messages());
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            };
            on_batch(session.messages());
            debug!(attempt, state = %state, "poll attempt");

            if state.is_terminal() {
                return Ok(state);
            }
        }

        warn!(attempts = self.max_attempts, "poll budget exhausted");
        Err(PollError::Timeout {
            attempts: self.max_attempts,
        })
    }
}

/// Poll budget validation errors
#[derive(Debug, thiserror::Error)]
pub enum PollBudgetError {
    #[error("poll_attempts must be in [1, 1000], got {value}")]
    AttemptsOutOfBounds { value: u32 },

    #[error("poll_interval_seconds must be at most 60, got {value}")]
    IntervalOutOfBounds { value: u64 },
}

/// Errors from a bounded poll loop
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("build did not complete after {attempts} polls")]
    Timeout { attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockTransport;
    use crate::options::CompileOptions;
    use rcc_protocol::Severity;
    use std::sync::Arc;

    fn instant(max_attempts: u32) -> PollBudget {
        PollBudget {
            max_attempts,
            interval: Duration::ZERO,
        }
    }

    fn started(transport: &Arc<MockTransport>) -> CompileSession {
        let mut session = CompileSession::new(transport.clone());
        let options = CompileOptions {
            platform: "K64F".to_string(),
            ..CompileOptions::default()
        };
        session.start(&options).unwrap();
        session
    }

    #[test]
    fn test_budget_default() {
        let budget = PollBudget::default();
        assert_eq!(budget.max_attempts, 50);
        assert_eq!(budget.interval, Duration::from_secs(2));
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn test_budget_from_config() {
        let budget = PollBudget::from_config(Some(5), None);
        assert_eq!(budget.max_attempts, 5);
        assert_eq!(budget.interval, Duration::from_secs(2));
    }

    #[test]
    fn test_budget_validation_attempts_zero() {
        assert!(matches!(
            instant(0).validate(),
            Err(PollBudgetError::AttemptsOutOfBounds { value: 0 })
        ));
    }

    #[test]
    fn test_budget_validation_attempts_too_large() {
        assert!(matches!(
            instant(1001).validate(),
            Err(PollBudgetError::AttemptsOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_budget_validation_interval_too_large() {
        let budget = PollBudget::from_config(None, Some(61));
        assert!(matches!(
            budget.validate(),
            Err(PollBudgetError::IntervalOutOfBounds { value: 61 })
        ));
    }

    #[test]
    fn test_drive_stops_at_terminal_state() {
        let transport = Arc::new(MockTransport::new());
        transport.service().push_batch(vec![Diagnostic::new(Severity::Verbose, "Compile: a.c")]);
        transport.service().push_batch(vec![]);
        transport.service().push_final_batch(vec![]);
        let mut session = started(&transport);

        let mut batches = 0;
        let state = instant(10).drive(&mut session, |_| batches += 1).unwrap();
        assert_eq!(state, SessionState::Succeeded);
        assert_eq!(batches, 3);
    }

    #[test]
    fn test_drive_exhausts_budget() {
        let transport = Arc::new(MockTransport::new());
        let mut session = started(&transport);

        let err = instant(4).drive(&mut session, |_| {}).unwrap_err();
        assert!(matches!(err, PollError::Timeout { attempts: 4 }));
        assert_eq!(session.state(), SessionState::Polling);
        assert_eq!(transport.service().request_count(crate::mock::Endpoint::Output), 4);
    }

    #[test]
    fn test_drive_propagates_compile_failure() {
        let transport = Arc::new(MockTransport::new());
        transport
            .service()
            .push_final_batch(vec![Diagnostic::new(Severity::Error, "expected ';'").at("/src/main.cpp", 3, 9)]);
        let mut session = started(&transport);

        let mut seen = Vec::new();
        let err = instant(10).drive(&mut session, |batch| seen.push(batch.len())).unwrap_err();
        assert!(matches!(err, PollError::Session(SessionError::CompileFailure { .. })));
        assert_eq!(seen, vec![1], "failing batch is still delivered");
        assert_eq!(session.state(), SessionState::Failed);
    }
}
