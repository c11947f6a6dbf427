//! Per-sample retry state machine.
//!
//! [`AttemptState`] tracks one sample through its bounded attempts; the
//! transition function is pure so the retry policy can be tested without any
//! generator.

use std::time::Duration;

use crate::config::GenerationConfig;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How many attempts one sample gets and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1.
    pub max_attempts: u32,
    /// Fixed wait after a failed attempt before the next one.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.max_attempts(), config.retry_delay())
    }
}

// ---------------------------------------------------------------------------
// AttemptState
// ---------------------------------------------------------------------------

/// Events that drive [`AttemptState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptEvent {
    /// Start the first attempt, or the next one after a retryable failure.
    Begin,
    Succeeded,
    Failed,
}

/// States of one sample.
///
/// ```text
/// Pending ──Begin──▶ Attempting(1)
/// Attempting(n) ──Succeeded──▶ Success(n)
/// Attempting(n) ──Failed──▶ RetryableFailure(n)   if n < max_attempts
///                           ExhaustedFailure(n)   otherwise
/// RetryableFailure(n) ──Begin──▶ Attempting(n + 1)
/// ```
///
/// Any other event leaves the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttemptState {
    #[default]
    Pending,
    Attempting { attempt: u32 },
    RetryableFailure { attempt: u32 },
    Success { attempts: u32 },
    ExhaustedFailure { attempts: u32 },
}

impl AttemptState {
    /// Apply `event` under `policy`.
    ///
    /// ```
    /// use std::time::Duration;
    /// use meeting_codeswitch::pipeline::{AttemptEvent, AttemptState, RetryPolicy};
    ///
    /// let policy = RetryPolicy::new(2, Duration::ZERO);
    /// let s = AttemptState::Pending
    ///     .advance(AttemptEvent::Begin, &policy)
    ///     .advance(AttemptEvent::Failed, &policy)
    ///     .advance(AttemptEvent::Begin, &policy)
    ///     .advance(AttemptEvent::Failed, &policy);
    /// assert_eq!(s, AttemptState::ExhaustedFailure { attempts: 2 });
    /// ```
    pub fn advance(self, event: AttemptEvent, policy: &RetryPolicy) -> Self {
        match (self, event) {
            (AttemptState::Pending, AttemptEvent::Begin) => AttemptState::Attempting { attempt: 1 },
            (AttemptState::Attempting { attempt }, AttemptEvent::Succeeded) => {
                AttemptState::Success { attempts: attempt }
            }
            (AttemptState::Attempting { attempt }, AttemptEvent::Failed) => {
                if attempt < policy.max_attempts {
                    AttemptState::RetryableFailure { attempt }
                } else {
                    AttemptState::ExhaustedFailure { attempts: attempt }
                }
            }
            (AttemptState::RetryableFailure { attempt }, AttemptEvent::Begin) => {
                AttemptState::Attempting {
                    attempt: attempt + 1,
                }
            }
            (state, _) => state,
        }
    }

    /// `true` once the sample has either succeeded or used up its attempts.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Success { .. } | AttemptState::ExhaustedFailure { .. }
        )
    }

    /// Current attempt number (1-based); 0 before the first attempt.
    pub fn attempt(&self) -> u32 {
        match *self {
            AttemptState::Pending => 0,
            AttemptState::Attempting { attempt } | AttemptState::RetryableFailure { attempt } => {
                attempt
            }
            AttemptState::Success { attempts } | AttemptState::ExhaustedFailure { attempts } => {
                attempts
            }
        }
    }

    /// A short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptState::Pending => "pending",
            AttemptState::Attempting { .. } => "attempting",
            AttemptState::RetryableFailure { .. } => "retrying",
            AttemptState::Success { .. } => "accepted",
            AttemptState::ExhaustedFailure { .. } => "dropped",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn default_state_is_pending() {
        assert_eq!(AttemptState::default(), AttemptState::Pending);
        assert_eq!(AttemptState::Pending.attempt(), 0);
    }

    #[test]
    fn first_success_takes_one_attempt() {
        let p = policy(3);
        let s = AttemptState::Pending
            .advance(AttemptEvent::Begin, &p)
            .advance(AttemptEvent::Succeeded, &p);
        assert_eq!(s, AttemptState::Success { attempts: 1 });
        assert!(s.is_terminal());
    }

    #[test]
    fn failures_retry_until_exhausted() {
        let p = policy(3);
        let mut s = AttemptState::Pending;
        let mut seen = Vec::new();
        while !s.is_terminal() {
            s = s.advance(AttemptEvent::Begin, &p);
            seen.push(s.attempt());
            s = s.advance(AttemptEvent::Failed, &p);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(s, AttemptState::ExhaustedFailure { attempts: 3 });
        assert_eq!(s.label(), "dropped");
    }

    #[test]
    fn success_after_retry_reports_attempt_count() {
        let p = policy(3);
        let s = AttemptState::Pending
            .advance(AttemptEvent::Begin, &p)
            .advance(AttemptEvent::Failed, &p)
            .advance(AttemptEvent::Begin, &p)
            .advance(AttemptEvent::Succeeded, &p);
        assert_eq!(s, AttemptState::Success { attempts: 2 });
    }

    #[test]
    fn single_attempt_policy_exhausts_immediately() {
        let p = policy(1);
        let s = AttemptState::Pending
            .advance(AttemptEvent::Begin, &p)
            .advance(AttemptEvent::Failed, &p);
        assert_eq!(s, AttemptState::ExhaustedFailure { attempts: 1 });
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn invalid_events_leave_state_unchanged() {
        let p = policy(3);
        assert_eq!(
            AttemptState::Pending.advance(AttemptEvent::Failed, &p),
            AttemptState::Pending
        );
        let done = AttemptState::Success { attempts: 1 };
        assert_eq!(done.advance(AttemptEvent::Begin, &p), done);
        let attempting = AttemptState::Attempting { attempt: 1 };
        assert_eq!(attempting.advance(AttemptEvent::Begin, &p), attempting);
    }

    #[test]
    fn policy_from_config_counts_first_attempt() {
        let config = GenerationConfig {
            max_retries: 2,
            retry_delay_ms: 250,
            ..GenerationConfig::default()
        };
        let p = RetryPolicy::from_config(&config);
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.retry_delay, Duration::from_millis(250));
    }
}
