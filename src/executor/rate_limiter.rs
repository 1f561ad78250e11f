//! Global probe pacing shared by every worker

use crate::error::{AppError, Result};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as Gcra,
};
use std::{num::NonZeroU32, time::Duration};

/// Evenly spaced admission gate
///
/// Admits one caller every `1/rate` seconds with no burst allowance, so M
/// admissions always span at least `(M-1)/rate` seconds no matter how many
/// workers compete for them. Share a single instance via `Arc`.
pub struct RateLimiter {
    limiter: Gcra<NotKeyed, InMemoryState, DefaultClock>,
    rate: u32,
    period: Duration,
}

impl RateLimiter {
    /// Create a limiter admitting `rate` operations per second
    pub fn new(rate: u32) -> Result<Self> {
        if rate == 0 {
            return Err(AppError::validation("Rate limit must be at least 1 operation per second"));
        }

        // Round the period up so the limiter never runs faster than asked
        let nanos = 1_000_000_000u64.div_ceil(u64::from(rate));
        let period = Duration::from_nanos(nanos);
        let quota = Quota::with_period(period)
            .ok_or_else(|| AppError::validation(format!("Rate limit {} is too high", rate)))?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            limiter: Gcra::direct(quota),
            rate,
            period,
        })
    }

    /// Wait until this caller is admitted
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Configured operations per second
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Spacing between consecutive admissions
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rate", &self.rate)
            .field("period", &self.period)
            .finish()
    }
}
