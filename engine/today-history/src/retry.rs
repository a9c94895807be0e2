//! Retry state machine for scheduled refreshes
//!
//! Each trigger gets one attempt plus at most `max_retries` retries, spaced by
//! a fixed delay. After the last failure the machine goes back to `Idle` and
//! waits for the next trigger.

use crate::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_SECS};
use std::time::Duration;

/// Bounded linear retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Fixed wait before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Total attempts allowed per trigger
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Attempting { attempt: u32 },
    Retrying { attempt: u32 },
    Succeeded { attempts: u32 },
    Failed { attempts: u32 },
}

/// What the scheduler should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    phase: RefreshPhase,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, phase: RefreshPhase::Idle }
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether a trigger is being worked on (attempt running or retry pending)
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, RefreshPhase::Attempting { .. } | RefreshPhase::Retrying { .. })
    }

    /// Start an attempt and return its 1-based number.
    ///
    /// From a resting phase this begins a new trigger; from `Retrying` it
    /// continues the current one.
    pub fn begin_attempt(&mut self) -> u32 {
        let attempt = match self.phase {
            RefreshPhase::Retrying { attempt } => attempt + 1,
            RefreshPhase::Attempting { attempt } => attempt,
            _ => 1,
        };
        self.phase = RefreshPhase::Attempting { attempt };
        attempt
    }

    /// Record a successful attempt
    pub fn record_success(&mut self) -> u32 {
        let attempts = self.current_attempt();
        self.phase = RefreshPhase::Succeeded { attempts };
        attempts
    }

    /// Record a failed attempt and decide whether to try again
    pub fn record_failure(&mut self) -> RetryDecision {
        let attempt = self.current_attempt();
        if attempt < self.policy.max_attempts() {
            self.phase = RefreshPhase::Retrying { attempt };
            RetryDecision::RetryAfter(self.policy.delay)
        } else {
            self.phase = RefreshPhase::Failed { attempts: attempt };
            RetryDecision::GiveUp
        }
    }

    /// Return to `Idle`, dropping any pending retry
    pub fn settle(&mut self) {
        self.phase = RefreshPhase::Idle;
    }

    fn current_attempt(&self) -> u32 {
        match self.phase {
            RefreshPhase::Attempting { attempt } | RefreshPhase::Retrying { attempt } => attempt,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy { max_retries: 2, delay: Duration::from_secs(600) }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay, Duration::from_secs(600));
    }

    #[test]
    fn test_success_on_first_attempt() {
        let mut machine = RetryMachine::new(policy());
        assert_eq!(machine.phase(), RefreshPhase::Idle);

        assert_eq!(machine.begin_attempt(), 1);
        assert!(machine.is_busy());
        assert_eq!(machine.record_success(), 1);
        assert_eq!(machine.phase(), RefreshPhase::Succeeded { attempts: 1 });

        machine.settle();
        assert_eq!(machine.phase(), RefreshPhase::Idle);
        assert!(!machine.is_busy());
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let mut machine = RetryMachine::new(policy());

        assert_eq!(machine.begin_attempt(), 1);
        assert_eq!(machine.record_failure(), RetryDecision::RetryAfter(Duration::from_secs(600)));
        assert_eq!(machine.phase(), RefreshPhase::Retrying { attempt: 1 });

        assert_eq!(machine.begin_attempt(), 2);
        assert_eq!(machine.record_failure(), RetryDecision::RetryAfter(Duration::from_secs(600)));

        assert_eq!(machine.begin_attempt(), 3);
        assert_eq!(machine.record_failure(), RetryDecision::GiveUp);
        assert_eq!(machine.phase(), RefreshPhase::Failed { attempts: 3 });
        assert!(!machine.is_busy());
    }

    #[test]
    fn test_delay_is_fixed() {
        let mut machine = RetryMachine::new(RetryPolicy { max_retries: 5, delay: Duration::from_secs(3) });
        for _ in 0..5 {
            machine.begin_attempt();
            assert_eq!(machine.record_failure(), RetryDecision::RetryAfter(Duration::from_secs(3)));
        }
    }

    #[test]
    fn test_success_after_retry_reports_attempts() {
        let mut machine = RetryMachine::new(policy());
        machine.begin_attempt();
        machine.record_failure();
        assert_eq!(machine.begin_attempt(), 2);
        assert_eq!(machine.record_success(), 2);
    }

    #[test]
    fn test_new_trigger_after_failure_starts_over() {
        let mut machine = RetryMachine::new(policy());
        for _ in 0..3 {
            machine.begin_attempt();
            machine.record_failure();
        }
        machine.settle();

        assert_eq!(machine.begin_attempt(), 1);
    }

    #[test]
    fn test_zero_retries() {
        let mut machine = RetryMachine::new(RetryPolicy { max_retries: 0, delay: Duration::ZERO });
        machine.begin_attempt();
        assert_eq!(machine.record_failure(), RetryDecision::GiveUp);
    }
}
