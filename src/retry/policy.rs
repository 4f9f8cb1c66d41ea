//! Exponential backoff with jitter for transient provider failures.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::defaults;
use crate::error::LlmError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Cap for both computed delays and server `retry-after` hints.
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub use_jitter: bool,
    /// Upper bound of the random extra delay, as a fraction of the base delay.
    pub jitter_factor: f64,
    /// Wait for the server's `retry-after` hint instead of the computed delay.
    pub honor_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::retry::MAX_ATTEMPTS,
            initial_delay: defaults::retry::INITIAL_DELAY,
            max_delay: defaults::retry::MAX_DELAY,
            backoff_multiplier: 2.0,
            use_jitter: true,
            jitter_factor: defaults::retry::JITTER_FACTOR,
            honor_retry_after: true,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::default().with_max_attempts(1)
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    pub const fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub const fn with_honor_retry_after(mut self, honor: bool) -> Self {
        self.honor_retry_after = honor;
        self
    }

    pub fn should_retry(&self, error: &LlmError) -> bool {
        error.is_retryable()
    }

    /// Backoff before retry number `attempt + 1` (zero-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let millis =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        if !millis.is_finite() {
            return self.max_delay;
        }
        Duration::from_millis(millis as u64).min(self.max_delay)
    }

    /// Delay to wait after `error` on zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32, error: &LlmError) -> Duration {
        if self.honor_retry_after {
            if let Some(secs) = error.retry_after() {
                return Duration::from_secs(secs).min(self.max_delay);
            }
        }
        let delay = self.base_delay(attempt);
        if self.use_jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let range = delay.as_millis() as f64 * self.jitter_factor;
        if range <= 0.0 {
            return delay;
        }
        let extra = rand::thread_rng().gen_range(0.0..=range);
        (delay + Duration::from_millis(extra as u64)).min(self.max_delay)
    }
}

/// Runs an operation under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `operation`, retrying retryable failures. When attempts run
    /// out the last error is returned with its attempt count recorded.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            attempt += 1;

            if !self.policy.should_retry(&error) {
                return Err(error);
            }
            if attempt >= max_attempts {
                return Err(error.with_attempts(attempt));
            }

            let delay = self.policy.delay_for(attempt - 1, &error);
            tracing::warn!(
                kind = %error.kind(),
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying after transient provider error"
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> LlmError {
        LlmError::ServiceUnavailableError {
            provider: "openai".into(),
            status: 503,
            message: "overloaded".into(),
            attempts: 1,
            original: None,
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn succeeds_on_second_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_policy().with_max_attempts(3));

        let result = executor
            .execute(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(unavailable())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error_with_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_policy().with_max_attempts(2));

        let err = executor
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(unavailable())
                }
            })
            .await
            .unwrap_err();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(err.attempts(), 2);
        assert!(matches!(err, LlmError::ServiceUnavailableError { status: 503, .. }));
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_policy().with_max_attempts(5));

        let err = executor
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(LlmError::AuthenticationError {
                        provider: "anthropic".into(),
                        message: "invalid x-api-key".into(),
                        original: None,
                    })
                }
            })
            .await
            .unwrap_err();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(err, LlmError::AuthenticationError { .. }));
    }

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350))
            .with_jitter(false);

        assert_eq!(policy.base_delay(0), Duration::from_millis(100));
        assert_eq!(policy.base_delay(1), Duration::from_millis(200));
        assert_eq!(policy.base_delay(2), Duration::from_millis(350));
    }

    #[test]
    fn jitter_only_adds() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_jitter_factor(0.5);
        for _ in 0..50 {
            let delay = policy.delay_for(0, &unavailable());
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn retry_after_hint_overrides_backoff() {
        let policy = RetryPolicy::new().with_max_delay(Duration::from_secs(3));
        let err = LlmError::RateLimitedError {
            provider: "groq".into(),
            message: "rate limited".into(),
            retry_after: Some(5),
            attempts: 1,
            original: None,
        };
        assert_eq!(policy.delay_for(0, &err), Duration::from_secs(3));
        let ignoring = policy.with_honor_retry_after(false).with_jitter(false);
        assert_eq!(ignoring.delay_for(0, &err), Duration::from_secs(1));
    }
}
