//! Recovery helpers for blocking file I/O
//!
//! Loads and saves of workbooks are retried a fixed number of times with a
//! fixed delay before the failure is surfaced as fatal.

mod retry;

pub use retry::{FixedDelay, RetryConfig, RetryExhausted, RetryPolicy, retry_with_policy};
