//! Error types for llm-relay.
//!
//! Every failure surfaced by an adapter is an [`LlmError`]. Each variant maps
//! to exactly one [`ErrorKind`], carries a human-readable message, and where
//! a vendor response was involved, keeps the raw vendor body in `original`
//! for diagnostics.

use serde_json::Value;
use thiserror::Error;

/// Machine-checkable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    QuotaExceeded,
    RateLimited,
    ServiceUnavailable,
    ModelUnavailable,
    Provider,
    UnsupportedProvider,
    Connection,
    Stream,
    Parse,
    Configuration,
}

impl ErrorKind {
    /// Stable snake_case name, suitable for metrics labels and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::QuotaExceeded => "quota_exceeded",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ModelUnavailable => "model_unavailable",
            Self::Provider => "provider",
            Self::UnsupportedProvider => "unsupported_provider",
            Self::Connection => "connection",
            Self::Stream => "stream",
            Self::Parse => "parse",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed error taxonomy of the adapter core.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Caller input that cannot be mapped onto the provider at all.
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Authentication failed for {provider}: {message}")]
    AuthenticationError {
        provider: String,
        message: String,
        original: Option<Value>,
    },

    #[error("Quota exceeded for {provider}: {message}")]
    QuotaExceededError {
        provider: String,
        message: String,
        original: Option<Value>,
    },

    #[error(
        "Rate limited by {provider}: {message}{}{}",
        retry_after_hint(.retry_after),
        attempts_hint(.attempts)
    )]
    RateLimitedError {
        provider: String,
        message: String,
        /// Server-provided wait hint, in seconds.
        retry_after: Option<u64>,
        attempts: u32,
        original: Option<Value>,
    },

    #[error(
        "{provider} unavailable (HTTP {status}): {message}{}",
        attempts_hint(.attempts)
    )]
    ServiceUnavailableError {
        provider: String,
        status: u16,
        message: String,
        attempts: u32,
        original: Option<Value>,
    },

    #[error("Model '{model}' unavailable on {provider}: {message}")]
    ModelUnavailableError {
        provider: String,
        model: String,
        message: String,
        original: Option<Value>,
    },

    #[error("{provider} error{}: {message}", status_hint(.status))]
    ProviderError {
        provider: String,
        status: Option<u16>,
        message: String,
        original: Option<Value>,
    },

    #[error("Unsupported provider '{name}'. Known providers: {}", .known.join(", "))]
    UnsupportedProviderError { name: String, known: Vec<String> },

    #[error("Connection error: {message}{}", attempts_hint(.attempts))]
    ConnectionError { message: String, attempts: u32 },

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

fn retry_after_hint(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

fn attempts_hint(attempts: &u32) -> String {
    if *attempts > 1 {
        format!(" after {attempts} attempts")
    } else {
        String::new()
    }
}

fn status_hint(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl LlmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            attempts: 1,
        }
    }

    /// In-band provider failure with no HTTP status (for example an error
    /// frame inside an otherwise successful stream).
    pub fn provider(
        provider: impl Into<String>,
        message: impl Into<String>,
        original: Option<Value>,
    ) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            status: None,
            message: message.into(),
            original,
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError { .. } => ErrorKind::Validation,
            Self::AuthenticationError { .. } => ErrorKind::Authentication,
            Self::QuotaExceededError { .. } => ErrorKind::QuotaExceeded,
            Self::RateLimitedError { .. } => ErrorKind::RateLimited,
            Self::ServiceUnavailableError { .. } => ErrorKind::ServiceUnavailable,
            Self::ModelUnavailableError { .. } => ErrorKind::ModelUnavailable,
            Self::ProviderError { .. } => ErrorKind::Provider,
            Self::UnsupportedProviderError { .. } => ErrorKind::UnsupportedProvider,
            Self::ConnectionError { .. } => ErrorKind::Connection,
            Self::StreamError(_) => ErrorKind::Stream,
            Self::ParseError(_) => ErrorKind::Parse,
            Self::ConfigurationError(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the adapter's retry loop may try the call again.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitedError { .. }
                | Self::ServiceUnavailableError { .. }
                | Self::ConnectionError { .. }
        )
    }

    /// Server-provided wait hint in seconds, if any.
    pub const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimitedError { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Number of attempts made before this error surfaced.
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::RateLimitedError { attempts, .. }
            | Self::ServiceUnavailableError { attempts, .. }
            | Self::ConnectionError { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    /// Record the attempt count on retryable variants; others are unchanged.
    pub fn with_attempts(mut self, count: u32) -> Self {
        match &mut self {
            Self::RateLimitedError { attempts, .. }
            | Self::ServiceUnavailableError { attempts, .. }
            | Self::ConnectionError { attempts, .. } => *attempts = count,
            _ => {}
        }
        self
    }

    /// Raw vendor error body, kept for diagnostics only.
    pub const fn original(&self) -> Option<&Value> {
        match self {
            Self::AuthenticationError { original, .. }
            | Self::QuotaExceededError { original, .. }
            | Self::RateLimitedError { original, .. }
            | Self::ServiceUnavailableError { original, .. }
            | Self::ModelUnavailableError { original, .. }
            | Self::ProviderError { original, .. } => original.as_ref(),
            _ => None,
        }
    }

    pub fn provider_name(&self) -> Option<&str> {
        match self {
            Self::AuthenticationError { provider, .. }
            | Self::QuotaExceededError { provider, .. }
            | Self::RateLimitedError { provider, .. }
            | Self::ServiceUnavailableError { provider, .. }
            | Self::ModelUnavailableError { provider, .. }
            | Self::ProviderError { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::connection(format!("request timed out: {err}"))
        } else {
            Self::connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_mentions_retry_after_and_attempts() {
        let err = LlmError::RateLimitedError {
            provider: "openai".into(),
            message: "slow down".into(),
            retry_after: Some(5),
            attempts: 1,
            original: None,
        }
        .with_attempts(3);

        let text = err.to_string();
        assert!(text.contains("retry after 5s"), "{text}");
        assert!(text.contains("after 3 attempts"), "{text}");
        assert_eq!(err.retry_after(), Some(5));
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn only_transient_kinds_are_retryable() {
        assert!(LlmError::connection("reset").is_retryable());
        assert!(!LlmError::validation("bad").is_retryable());
        let auth = LlmError::AuthenticationError {
            provider: "cohere".into(),
            message: "invalid api token".into(),
            original: None,
        };
        assert!(!auth.is_retryable());
        // attempts are not tracked on fatal errors
        assert_eq!(auth.clone().with_attempts(4).attempts(), 1);
    }

    #[test]
    fn unsupported_provider_lists_known_names() {
        let err = LlmError::UnsupportedProviderError {
            name: "nonexistent".into(),
            known: vec!["anthropic".into(), "bedrock".into()],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported provider 'nonexistent'. Known providers: anthropic, bedrock"
        );
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let json_err = serde_json::from_str::<Value>("{not json").unwrap_err();
        let err: LlmError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
