//! Retry backoff policies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the delay grows with consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Exponential backoff: base * 2^(failures - 1)
    Exponential,
    /// Linear backoff: base * failures
    Linear,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential
    }
}

/// Maps a job's failure count to the delay before its next retry.
///
/// The failure count positions the job on the curve independently of how
/// large its retry budget is, so topping up retries on a flapping job does
/// not reset it to short delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Base delay before the first retry
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    /// Growth strategy
    pub strategy: BackoffStrategy,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3600),
            strategy: BackoffStrategy::Exponential,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy with fixed delays.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            max_delay: delay,
            strategy: BackoffStrategy::Fixed,
        }
    }

    /// Create a policy with exponential backoff.
    pub fn exponential(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            strategy: BackoffStrategy::Exponential,
        }
    }

    /// Create a policy with linear backoff.
    pub fn linear(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            strategy: BackoffStrategy::Linear,
        }
    }

    /// Calculate the delay for a given failure count (1-indexed).
    pub fn delay_for_failure(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;

        let delay_ms = match self.strategy {
            BackoffStrategy::Fixed => base_ms,
            BackoffStrategy::Exponential => {
                let exp = 2_f64.powi((failures - 1) as i32);
                (base_ms * exp).min(max_ms)
            }
            BackoffStrategy::Linear => {
                let linear = base_ms * (failures as f64);
                linear.min(max_ms)
            }
        };

        Duration::from_millis(delay_ms as u64)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_calculates_correctly() {
        let policy = BackoffPolicy::exponential(Duration::from_millis(100), Duration::from_secs(10));

        assert_eq!(policy.delay_for_failure(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_failure(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_failure(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_failure(4), Duration::from_millis(800));
    }

    #[test]
    fn exponential_backoff_respects_cap() {
        let policy = BackoffPolicy::exponential(Duration::from_millis(100), Duration::from_millis(300));

        assert_eq!(policy.delay_for_failure(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_failure(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for_failure(30), Duration::from_millis(300));
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let policy = BackoffPolicy::fixed(Duration::from_millis(500));

        assert_eq!(policy.delay_for_failure(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_failure(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for_failure(3), Duration::from_millis(500));
    }

    #[test]
    fn linear_backoff_increases_linearly() {
        let policy = BackoffPolicy::linear(Duration::from_millis(100), Duration::from_secs(10));

        assert_eq!(policy.delay_for_failure(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_failure(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_failure(3), Duration::from_millis(300));
    }

    #[test]
    fn zero_failures_means_no_delay() {
        assert_eq!(
            BackoffPolicy::default().delay_for_failure(0),
            Duration::ZERO
        );
    }
}
