//! Reconnect backoff for a single worker connection

use crate::error::{AppError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded reconnect envelope
///
/// Delays start at `min_backoff`, double with each retry plus jitter, and
/// never exceed `max_backoff`. After `max_retries` failed retries the
/// connection gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_backoff: crate::defaults::DEFAULT_MIN_RETRY_BACKOFF,
            max_backoff: crate::defaults::DEFAULT_MAX_RETRY_BACKOFF,
            max_retries: crate::defaults::DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.min_backoff > self.max_backoff {
            return Err(AppError::config(format!(
                "Minimum retry backoff ({}ms) exceeds maximum ({}ms)",
                self.min_backoff.as_millis(),
                self.max_backoff.as_millis()
            )));
        }
        Ok(())
    }

    /// Delay before retry number `retry` (zero-based)
    pub fn backoff<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let min = self.min_backoff.as_nanos().min(u64::MAX as u128) as u64;
        let max = self.max_backoff.as_nanos().min(u64::MAX as u128) as u64;

        if max == 0 {
            return Duration::ZERO;
        }

        let span = if retry >= 63 {
            u64::MAX
        } else {
            min.saturating_mul(1u64 << retry)
        };
        if span == 0 {
            return Duration::from_nanos(min.min(max));
        }

        let delay = min.saturating_add(rng.random_range(0..span));
        Duration::from_nanos(delay.min(max).max(min.min(max)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn policy(min_ms: u64, max_ms: u64) -> RetryPolicy {
        RetryPolicy {
            min_backoff: Duration::from_millis(min_ms),
            max_backoff: Duration::from_millis(max_ms),
            max_retries: 10,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.min_backoff, Duration::from_millis(1));
        assert_eq!(policy.max_backoff, Duration::from_millis(50));
        assert_eq!(policy.max_retries, 1000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_backoff_stays_within_bounds() {
        let policy = policy(1, 50);
        let mut rng = StdRng::seed_from_u64(7);

        for retry in 0..200 {
            let delay = policy.backoff(retry, &mut rng);
            assert!(delay >= policy.min_backoff, "retry {} gave {:?}", retry, delay);
            assert!(delay <= policy.max_backoff, "retry {} gave {:?}", retry, delay);
        }
    }

    #[test]
    fn test_first_retry_is_below_twice_minimum() {
        let policy = policy(10, 1000);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let delay = policy.backoff(0, &mut rng);
            assert!(delay >= Duration::from_millis(10));
            assert!(delay < Duration::from_millis(20));
        }
    }

    #[test]
    fn test_late_retries_reach_the_cap() {
        let policy = policy(1, 50);
        let mut rng = StdRng::seed_from_u64(3);

        let capped = (0..100)
            .filter(|_| policy.backoff(20, &mut rng) == policy.max_backoff)
            .count();
        assert!(capped > 90);
    }

    #[test]
    fn test_zero_backoff() {
        let policy = policy(0, 0);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(policy.backoff(5, &mut rng), Duration::ZERO);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(policy(100, 10).validate().is_err());
    }
}
