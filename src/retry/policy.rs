//! Retry policies: attempt number in, wait time (or stop) out.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Decides how long to wait before the next attempt.
///
/// `attempt` is the number of the attempt that just failed, starting at 1.
/// `None` means stop retrying.
pub trait RetryPolicy: Send + Sync {
    fn wait_time(&self, attempt: u32) -> Option<Duration>;
}

impl<F> RetryPolicy for F
where
    F: Fn(u32) -> Option<Duration> + Send + Sync,
{
    fn wait_time(&self, attempt: u32) -> Option<Duration> {
        self(attempt)
    }
}

/// Same delay before every retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl RetryPolicy for FixedDelay {
    fn wait_time(&self, _attempt: u32) -> Option<Duration> {
        Some(self.delay)
    }
}

/// Geometric backoff: `base^(attempt - 1)` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: u64,
}

impl Backoff {
    pub fn new(base: u64) -> Self {
        Self { base }
    }
}

impl RetryPolicy for Backoff {
    fn wait_time(&self, attempt: u32) -> Option<Duration> {
        let exponent = attempt.saturating_sub(1);
        Some(Duration::from_millis(self.base.saturating_pow(exponent)))
    }
}

pub fn fixed_duration(delay: Duration) -> FixedDelay {
    FixedDelay::new(delay)
}

pub fn backoff(base: u64) -> Backoff {
    Backoff::new(base)
}

/// Stops once `attempt` exceeds `max`.
#[derive(Debug, Clone)]
pub struct MaxRetries<P> {
    inner: P,
    max: u32,
}

impl<P: RetryPolicy> RetryPolicy for MaxRetries<P> {
    fn wait_time(&self, attempt: u32) -> Option<Duration> {
        if attempt > self.max {
            return None;
        }
        self.inner.wait_time(attempt)
    }
}

/// Adds uniform random jitter in `[0, max_jitter)` to every delay.
///
/// Each instance owns its generator.
pub struct Jittered<P> {
    inner: P,
    max_jitter_ms: u64,
    rng: Mutex<StdRng>,
}

impl<P: RetryPolicy> RetryPolicy for Jittered<P> {
    fn wait_time(&self, attempt: u32) -> Option<Duration> {
        let delay = self.inner.wait_time(attempt)?;
        if self.max_jitter_ms == 0 {
            return Some(delay);
        }
        let jitter = self.rng.lock().gen_range(0..self.max_jitter_ms);
        Some(delay.saturating_add(Duration::from_millis(jitter)))
    }
}

impl<P: std::fmt::Debug> std::fmt::Debug for Jittered<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jittered")
            .field("inner", &self.inner)
            .field("max_jitter_ms", &self.max_jitter_ms)
            .finish()
    }
}

pub trait RetryPolicyExt: RetryPolicy + Sized {
    fn with_max_retry_count(self, max: u32) -> MaxRetries<Self> {
        MaxRetries { inner: self, max }
    }

    fn with_jitter(self, max_jitter: Duration) -> Jittered<Self> {
        Jittered {
            inner: self,
            max_jitter_ms: u64::try_from(max_jitter.as_millis()).unwrap_or(u64::MAX),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl<P: RetryPolicy + Sized> RetryPolicyExt for P {}
