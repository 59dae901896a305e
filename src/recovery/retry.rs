//! Retry logic for blocking workbook I/O

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::file_io()
    }
}

impl RetryConfig {
    /// Configuration for workbook load and save
    pub fn file_io() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Retry policy that determines whether to retry and how long to wait
pub trait RetryPolicy {
    fn should_retry(&self, attempt: u32, error: &anyhow::Error) -> bool;
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same wait between every attempt, every error retried
pub struct FixedDelay {
    config: RetryConfig,
}

impl FixedDelay {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryPolicy for FixedDelay {
    fn should_retry(&self, attempt: u32, _error: &anyhow::Error) -> bool {
        attempt < self.config.max_attempts
    }

    fn delay(&self, _attempt: u32) -> Duration {
        self.config.delay
    }
}

/// Outcome of an exhausted retry loop
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: anyhow::Error,
}

/// Retry a synchronous operation with a given policy
pub fn retry_with_policy<T, F>(
    mut operation: F,
    policy: &dyn RetryPolicy,
    operation_name: &str,
) -> std::result::Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Result<T>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt) {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if policy.should_retry(attempt, &err) {
                    let delay = policy.delay(attempt);
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying operation after delay"
                    );
                    std::thread::sleep(delay);
                } else {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn quick(attempts: u32) -> FixedDelay {
        FixedDelay::new(RetryConfig::none().with_attempts(attempts))
    }

    #[test]
    fn test_retry_policy_max_attempts() {
        let policy = quick(2);
        let err = anyhow!("locked");
        assert!(policy.should_retry(1, &err));
        assert!(!policy.should_retry(2, &err));
    }

    #[test]
    fn test_retry_with_policy_success_on_retry() {
        let result = retry_with_policy(
            |attempt| {
                if attempt < 3 {
                    Err(anyhow!("file busy"))
                } else {
                    Ok(42)
                }
            },
            &quick(3),
            "test_operation",
        );
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_retry_with_policy_fail_after_max_attempts() {
        let mut calls = 0;
        let result = retry_with_policy(
            |_| {
                calls += 1;
                Err::<i32, _>(anyhow!("still busy"))
            },
            &quick(3),
            "test_operation",
        );
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(calls, 3);
        assert_eq!(exhausted.last_error.to_string(), "still busy");
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryConfig::none().with_attempts(0).max_attempts, 1);
    }
}
