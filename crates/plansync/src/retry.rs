//! Shared exponential-backoff policy for connection and batch retries.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Exponential backoff calculator.
///
/// Both the connection manager and the batch writer use the same policy so
/// that retries escalate consistently: `next(attempt)` for a 0-based attempt
/// index is `min(max_period, base_period * multiplier^attempt)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_period: Duration,
    /// Ceiling on the computed delay.
    pub max_period: Duration,
    /// Backoff multiplier applied per attempt.
    pub multiplier: f64,
    /// Maximum number of retries before giving up.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_period: Duration::from_millis(500),
            max_period: Duration::from_secs(60),
            multiplier: 2.0,
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    /// Compute the backoff interval for the given 0-based attempt index.
    pub fn next(&self, attempt: u32) -> Duration {
        let scaled = self.base_period.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = scaled.min(self.max_period.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Start tracking a new retry sequence.
    pub fn begin(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempt: 0,
        }
    }
}

/// Per-attempt state for one connection or batch retry sequence.
///
/// Created per attempt sequence and discarded on success or once the
/// maximum attempt count is exceeded.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    /// Number of retries consumed so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Whether another retry is permitted.
    pub fn can_retry(&self) -> bool {
        self.attempt < self.policy.max_retries
    }

    /// Sleep out the backoff interval for the current attempt and advance.
    ///
    /// Cancellation is cooperative: a cancel arriving mid-sleep cuts the
    /// sleep short but still lets the caller proceed with the retry; the
    /// pipeline observes the token at its next decision point.
    pub async fn wait(&mut self, cancel: &CancellationToken) {
        let delay = self.policy.next(self.attempt);
        debug!("retry {}: backing off {:?}", self.attempt + 1, delay);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {}
        }
        self.attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, max_ms: u64, multiplier: f64) -> RetryPolicy {
        RetryPolicy {
            base_period: Duration::from_millis(base_ms),
            max_period: Duration::from_millis(max_ms),
            multiplier,
            max_retries: 5,
        }
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let p = policy(100, 1000, 2.0);
        assert_eq!(p.next(0), Duration::from_millis(100));
        assert_eq!(p.next(1), Duration::from_millis(200));
        assert_eq!(p.next(2), Duration::from_millis(400));
        assert_eq!(p.next(3), Duration::from_millis(800));
        assert_eq!(p.next(4), Duration::from_millis(1000));
        assert_eq!(p.next(10), Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_non_decreasing_and_capped() {
        for &(base, max, mult) in &[(50u64, 400u64, 1.5f64), (200, 5000, 2.0), (10, 10, 3.0)] {
            let p = policy(base, max, mult);
            let mut prev = Duration::ZERO;
            for attempt in 0..20 {
                let d = p.next(attempt);
                assert!(d >= prev, "backoff decreased at attempt {}", attempt);
                assert!(d <= p.max_period, "backoff exceeded ceiling");
                prev = d;
            }
        }
    }

    #[test]
    fn test_retry_state_respects_ceiling() {
        let p = RetryPolicy {
            max_retries: 2,
            ..policy(1, 10, 2.0)
        };
        let mut state = p.begin();
        assert!(state.can_retry());
        state.attempt = 2;
        assert!(!state.can_retry());
        assert_eq!(state.attempts(), 2);
    }

    #[tokio::test]
    async fn test_wait_returns_early_on_cancel() {
        let p = RetryPolicy {
            base_period: Duration::from_secs(3600),
            ..RetryPolicy::default()
        };
        let mut state = p.begin();
        let cancel = CancellationToken::new();
        cancel.cancel();
        // Must not block for an hour.
        state.wait(&cancel).await;
        assert_eq!(state.attempts(), 1);
    }
}
