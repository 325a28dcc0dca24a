//! Reconnect delays for the producer stream.
//!
//! Exponential growth from `base_delay` by `multiplier` per consecutive
//! failure, capped at `max_delay`, then spread by a random factor in
//! `[1 - jitter, 1 + jitter]` so a fleet of relays restarted together does
//! not reconnect in lockstep.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default delay before the first reconnect.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);
/// Default growth factor per consecutive failure.
pub const DEFAULT_MULTIPLIER: f64 = 1.2;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER: f64 = 0.4;
/// Default upper bound on the un-jittered delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Backoff parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub jitter: f64,
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: DEFAULT_JITTER,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Tracks consecutive failures and hands out the next delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    failures: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            failures: 0,
        }
    }

    /// The un-jittered delay for the current failure count.
    pub fn current_delay(&self) -> Duration {
        let base = self.config.base_delay.as_secs_f64();
        let max = self.config.max_delay.as_secs_f64();
        let exp = i32::try_from(self.failures).unwrap_or(i32::MAX);
        let secs = (base * self.config.multiplier.max(1.0).powi(exp)).min(max);
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Returns the delay to wait before the next attempt and counts the
    /// failure that caused it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_delay();
        self.failures = self.failures.saturating_add(1);

        let jitter = self.config.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return delay;
        }
        let factor = rand::rng().random_range((1.0 - jitter)..=(1.0 + jitter));
        delay.mul_f64(factor)
    }

    /// Forgets past failures. Called once a stream delivers data again.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> BackoffConfig {
        BackoffConfig {
            jitter: 0.0,
            ..BackoffConfig::default()
        }
    }

    #[test]
    fn test_grows_then_caps() {
        let mut backoff = Backoff::new(no_jitter());
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs_f64(2.4));

        for _ in 0..20 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_reset_starts_over() {
        let mut backoff = Backoff::new(no_jitter());
        for _ in 0..5 {
            backoff.next_delay();
        }
        backoff.reset();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        for _ in 0..200 {
            let nominal = backoff.current_delay().as_secs_f64();
            let delay = backoff.next_delay().as_secs_f64();
            assert!(delay >= nominal * 0.6 - 1e-9, "{delay} below band");
            assert!(delay <= nominal * 1.4 + 1e-9, "{delay} above band");
        }
    }
}
