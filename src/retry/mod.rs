//! Retry support for adapter calls.
//!
//! Only errors whose [`is_retryable`](crate::LlmError::is_retryable) is true
//! are retried: rate limits, 5xx responses and connection failures.

mod policy;

pub use policy::{RetryExecutor, RetryPolicy};
