//! Per-part retry policy.

use std::time::Duration;

/// Retry behavior for a single part, kept as data rather than
/// control flow so the worker loop stays flat.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per part, including the first.
    pub max_attempts: u32,
    /// Base delay for linear backoff.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after `failed_attempt` (1-based) fails:
    /// `failed_attempt * base_delay`, so 1 s then 2 s with defaults.
    pub fn backoff_after(&self, failed_attempt: u32) -> Duration {
        self.base_delay * failed_attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_after(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_after(2), Duration::from_secs(2));
    }

    #[test]
    fn backoff_scales_with_base_delay() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
        };
        assert_eq!(policy.backoff_after(2), Duration::from_millis(500));
    }
}
