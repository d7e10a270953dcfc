//! Pacing and retry policies
//!
//! Both are injected into the engine so tests can run without waiting.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Supplies the wait before the next request
pub trait Pacer: Send + Sync {
    fn next_delay(&mut self) -> Duration;
}

/// Uniformly random wait within `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomPacer {
    min_secs: f64,
    max_secs: f64,
}

impl RandomPacer {
    /// Creates a pacer; bounds are reordered if given backwards
    pub fn new(min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min_secs: min.as_secs_f64(),
            max_secs: max.as_secs_f64(),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_secs_f64(config.delay_min),
            Duration::from_secs_f64(config.delay_max),
        )
    }
}

impl Pacer for RandomPacer {
    fn next_delay(&mut self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }
}

/// No wait at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn next_delay(&mut self) -> Duration {
        Duration::ZERO
    }
}

/// How often and how patiently a failed page is retried
///
/// Only transport failures are retried. The wait before retry `n` is
/// `backoff * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// One attempt per page
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.fetch_retries,
            Duration::from_secs_f64(config.retry_backoff),
        )
    }

    /// Wait before the given retry (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}
