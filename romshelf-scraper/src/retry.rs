//! Bounded retry with exponential backoff for remote operations.
//!
//! The retry lifecycle is an explicit state machine so the backoff timing
//! and attempt-count invariants can be tested without any clock.

use std::future::Future;

use tokio::time::Duration;

use crate::error::{FailureKind, ScrapeError};

/// Retry ceiling and backoff curve for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the attempt that follows failed attempt `attempt`:
    /// `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt.saturating_sub(1)).min(16);
        (self.base_delay * factor).min(self.max_delay)
    }
}

/// Lifecycle of one retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    Pending,
    InFlight { attempt: u32 },
    RetryScheduled { attempt: u32, delay: Duration },
    Succeeded,
    FailedPermanently,
}

impl RetryState {
    pub fn new() -> Self {
        Self::Pending
    }

    /// Backoff owed before the next attempt may start.
    pub fn scheduled_delay(&self) -> Option<Duration> {
        match *self {
            Self::RetryScheduled { delay, .. } => Some(delay),
            _ => None,
        }
    }

    /// Move to `InFlight`, returning the attempt number to run, or `None`
    /// if the operation is already in flight or terminal.
    pub fn start_attempt(&mut self) -> Option<u32> {
        let attempt = match *self {
            Self::Pending => 1,
            Self::RetryScheduled { attempt, .. } => attempt + 1,
            Self::InFlight { .. } | Self::Succeeded | Self::FailedPermanently => return None,
        };
        *self = Self::InFlight { attempt };
        Some(attempt)
    }

    /// Record the outcome of the in-flight attempt. Transient failures
    /// schedule a retry until the policy's ceiling; permanent failures and
    /// exhausted ceilings are terminal.
    pub fn settle(&mut self, policy: &RetryPolicy, outcome: Result<(), FailureKind>) {
        let Self::InFlight { attempt } = *self else {
            return;
        };
        *self = match outcome {
            Ok(()) => Self::Succeeded,
            Err(FailureKind::Permanent) => Self::FailedPermanently,
            Err(FailureKind::Transient) if attempt >= policy.max_attempts => {
                Self::FailedPermanently
            }
            Err(FailureKind::Transient) => Self::RetryScheduled {
                attempt,
                delay: policy.backoff_delay(attempt),
            },
        };
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedPermanently)
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive `op` through the retry state machine until it succeeds or fails
/// permanently. The operation itself is responsible for acquiring a rate
/// budget permit, so every retry attempt is budgeted like a fresh call.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut state = RetryState::new();
    loop {
        if let Some(delay) = state.scheduled_delay() {
            tokio::time::sleep(delay).await;
        }
        let attempt = state
            .start_attempt()
            .expect("retry loop resumed from a terminal state");
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                state.settle(policy, Err(err.failure_kind()));
                if state.is_terminal() {
                    return Err(err);
                }
                log::debug!(
                    "transient failure on attempt {attempt}, retrying after {:?}: {err}",
                    state.scheduled_delay().unwrap_or(Duration::ZERO),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(3));
        assert_eq!(policy.backoff_delay(5), Duration::from_secs(3));
    }

    #[test]
    fn test_transient_failures_schedule_retries_up_to_ceiling() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        let mut state = RetryState::new();

        assert_eq!(state.start_attempt(), Some(1));
        state.settle(&policy, Err(FailureKind::Transient));
        assert_eq!(
            state.scheduled_delay(),
            Some(policy.backoff_delay(1)),
        );

        assert_eq!(state.start_attempt(), Some(2));
        state.settle(&policy, Err(FailureKind::Transient));
        assert_eq!(state.start_attempt(), Some(3));
        state.settle(&policy, Err(FailureKind::Transient));

        // Ceiling reached: terminal, no further attempts.
        assert_eq!(state, RetryState::FailedPermanently);
        assert_eq!(state.start_attempt(), None);
    }

    #[test]
    fn test_permanent_failure_is_immediately_terminal() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new();
        state.start_attempt();
        state.settle(&policy, Err(FailureKind::Permanent));
        assert_eq!(state, RetryState::FailedPermanently);
        assert_eq!(state.start_attempt(), None);
    }

    #[test]
    fn test_success_is_terminal() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new();
        state.start_attempt();
        state.settle(&policy, Ok(()));
        assert_eq!(state, RetryState::Succeeded);
        assert_eq!(state.start_attempt(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_retry_counts_attempts() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ScrapeError::transient("socket reset")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_with_retry_stops_on_permanent_error() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ScrapeError::permanent("bad credentials")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_retry_recovers_after_transient_failure() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result = run_with_retry(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ScrapeError::transient("503"))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
