//! Default values shared across the crate.

use std::time::Duration;

pub mod http {
    use super::Duration;

    /// Whole-request timeout for non-streaming calls.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &str = concat!("llm-relay/", env!("CARGO_PKG_VERSION"));
}

pub mod retry {
    use super::Duration;

    pub const MAX_ATTEMPTS: u32 = 3;
    pub const INITIAL_DELAY: Duration = Duration::from_millis(1000);
    pub const MAX_DELAY: Duration = Duration::from_secs(60);
    pub const JITTER_FACTOR: f64 = 0.1;
}

pub mod cache {
    use super::Duration;

    pub const TTL: Duration = Duration::from_secs(300);
    pub const CAPACITY: usize = 256;
}

pub mod batch {
    pub const MAX_BATCH_SIZE: usize = 10;
}

/// Output budget sent to vendors that require one (Anthropic) when the
/// caller did not set `max_tokens` and the model has no known limit.
pub const FALLBACK_MAX_OUTPUT: u32 = 4096;
