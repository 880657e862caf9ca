//! Retry policies shared by the CRM integrations.
//!
//! Token refresh uses [`BackoffPolicy`] (exponential, capped). Lead pagination
//! uses [`FixedDelayPolicy`] for 429 responses. Both are bounded.

use std::time::Duration;

/// Exponential backoff: `base * 2^attempt`, capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt + 1`; `attempt` starts at 0.
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let shift = attempt.min(63);
        let exp = 1u128 << shift;
        let ms = (self.base_delay_ms as u128).saturating_mul(exp);
        ms.min(self.max_delay_ms as u128) as u64
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms(attempt))
    }

    /// Whether another retry is allowed after `attempt` retries have happened.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// The full sleep schedule of a call that keeps failing.
    pub fn schedule_ms(&self) -> Vec<u64> {
        (0..self.max_retries).map(|a| self.delay_ms(a)).collect()
    }
}

/// Fixed pause between retries of the same request, bounded per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelayPolicy {
    pub delay_ms: u64,
    /// Consecutive retries allowed for one request.
    pub max_retries: u32,
}

impl Default for FixedDelayPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 1_000,
            max_retries: 10,
        }
    }
}

impl FixedDelayPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn can_retry(&self, retries: u32) -> bool {
        retries < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_schedule() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.schedule_ms(), vec![1_000, 2_000, 4_000, 8_000, 16_000]);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_ms(5), 30_000);
        assert_eq!(policy.delay_ms(10), 30_000);
        assert_eq!(policy.delay_ms(u32::MAX), 30_000);
    }

    #[test]
    fn test_backoff_retry_bound() {
        let policy = BackoffPolicy::default();
        assert!(policy.can_retry(0));
        assert!(policy.can_retry(4));
        assert!(!policy.can_retry(5));
    }

    #[test]
    fn test_fixed_delay_bound() {
        let policy = FixedDelayPolicy {
            delay_ms: 1_000,
            max_retries: 2,
        };
        assert_eq!(policy.delay(), Duration::from_secs(1));
        assert!(policy.can_retry(1));
        assert!(!policy.can_retry(2));
    }
}
