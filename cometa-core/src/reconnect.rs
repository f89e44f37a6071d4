//! Jittered exponential backoff for heartbeat-triggered reconnection.
//!
//! The original firmware has no backoff at all; this adds a randomized
//! delay so a whole fleet of devices reconnecting to the same relay
//! doesn't retry in lockstep. The device retries forever — there's no
//! permanently-failed state here, unlike a server-side reconnect manager
//! with an attempt cap.

use rand::Rng;
use std::time::Duration;

/// Backoff configuration.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Initial delay.
    pub base: Duration,
    /// Maximum delay.
    pub max: Duration,
    /// Multiplier for each attempt.
    pub factor: f64,
    /// Jitter factor (0.0 - 1.0).
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: 0.3,
        }
    }
}

/// Exponential backoff calculator.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
}

impl Backoff {
    /// Create a new backoff calculator.
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Get the next delay and increment the attempt counter.
    #[must_use]
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.calculate_delay();
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Reset the backoff. Call after a successful reconnection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Current attempt number.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    fn calculate_delay(&self) -> Duration {
        let base_secs = self.config.base.as_secs_f64();
        let attempt: i32 = self
            .attempt
            .min(i32::MAX as u32)
            .try_into()
            .unwrap_or(i32::MAX);
        let exp_delay = base_secs * self.config.factor.powi(attempt);

        let jitter_range = exp_delay * self.config.jitter;
        let jitter = rand::rng().random_range(-jitter_range..=jitter_range);
        let delay_with_jitter = (exp_delay + jitter).max(0.0);

        let final_secs = delay_with_jitter.min(self.config.max.as_secs_f64());
        Duration::from_secs_f64(final_secs)
    }
}
