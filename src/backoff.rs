//! Exponential backoff with jitter.

use std::time::Duration;

use rand::prelude::*;

/// Backoff configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Backoff before the first retry.
    pub init_backoff: Duration,

    /// Upper bound of any pause.
    pub max_backoff: Duration,

    /// Growth factor per retry.
    pub base: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            init_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            base: 2.0,
        }
    }
}

/// Computes backoff pauses for one logical request.
///
/// The pause before retry `n` is drawn uniformly from the upper half of
/// `init * base^n`, capped at `max_backoff`, so concurrent retriers spread
/// out instead of stampeding in lockstep.
#[derive(Debug)]
pub struct Backoff {
    config: BackoffConfig,
    error_count: u32,
}

impl Backoff {
    pub fn new(config: &BackoffConfig) -> Self {
        Self {
            config: config.clone(),
            error_count: 0,
        }
    }

    /// The next pause; each call accounts for one more failed attempt.
    pub fn next(&mut self) -> Duration {
        let pause = pause_for(&self.config, self.error_count);
        self.error_count = self.error_count.saturating_add(1);
        pause
    }
}

/// The pause after `error_count` failed attempts.
pub(crate) fn pause_for(config: &BackoffConfig, error_count: u32) -> Duration {
    let exp = config.init_backoff.as_secs_f64() * config.base.powi(error_count as i32);
    let capped = exp.min(config.max_backoff.as_secs_f64());
    let jittered = thread_rng().gen_range(capped / 2.0..=capped);
    Duration::from_secs_f64(jittered)
}
