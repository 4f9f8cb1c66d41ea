//! Adapter configuration.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::time::Duration;

use crate::defaults;
use crate::providers::ProviderId;
use crate::retry::RetryPolicy;

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout. Streaming requests only use `connect_timeout`.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Extra headers sent on every request.
    pub headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: defaults::http::REQUEST_TIMEOUT,
            connect_timeout: defaults::http::CONNECT_TIMEOUT,
            user_agent: defaults::http::USER_AGENT.to_string(),
            headers: HashMap::new(),
        }
    }
}

/// Response cache settings. Only non-streaming completions are cached.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: defaults::cache::TTL,
            capacity: defaults::cache::CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Queue length that triggers an automatic flush.
    pub max_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: defaults::batch::MAX_BATCH_SIZE,
        }
    }
}

/// Vendor-specific knobs. Each provider reads only the fields it needs.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// OpenAI organization id.
    pub organization: Option<String>,
    /// OpenAI project id.
    pub project: Option<String>,
    /// Azure `api-version` query value or Anthropic `anthropic-version`.
    pub api_version: Option<String>,
    /// Azure resource name (`{resource}.openai.azure.com`).
    pub resource: Option<String>,
    /// AWS region for Bedrock.
    pub region: Option<String>,
    /// Google Cloud project for Vertex AI.
    pub gcp_project: Option<String>,
    /// Google Cloud location for Vertex AI.
    pub location: Option<String>,
    /// OpenRouter attribution headers.
    pub referer: Option<String>,
    pub app_title: Option<String>,
}

/// Everything needed to construct an [`Adapter`](crate::Adapter).
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub api_key: Option<SecretString>,
    /// Overrides the provider's default base URL.
    pub base_url: Option<String>,
    pub http: HttpConfig,
    pub retry: RetryPolicy,
    pub cache: Option<CacheConfig>,
    pub track_costs: bool,
    pub batch: Option<BatchConfig>,
    pub settings: ProviderSettings,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            http: HttpConfig::default(),
            retry: RetryPolicy::default(),
            cache: None,
            track_costs: true,
            batch: None,
            settings: ProviderSettings::default(),
        }
    }
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration from the provider's conventional environment
    /// variables. Missing variables leave fields unset.
    pub fn from_env(provider: ProviderId) -> Self {
        let mut config = Self::default();
        config.api_key = provider
            .profile()
            .api_key_env
            .iter()
            .find_map(|name| non_empty_env(name))
            .map(SecretString::from);

        let settings = &mut config.settings;
        match provider {
            ProviderId::OpenAi => {
                settings.organization = non_empty_env("OPENAI_ORGANIZATION");
                settings.project = non_empty_env("OPENAI_PROJECT");
            }
            ProviderId::AzureOpenAi => {
                settings.resource = non_empty_env("AZURE_OPENAI_RESOURCE");
                settings.api_version = non_empty_env("AZURE_OPENAI_API_VERSION");
            }
            ProviderId::Bedrock => {
                settings.region = non_empty_env("AWS_REGION").or_else(|| non_empty_env("AWS_DEFAULT_REGION"));
            }
            ProviderId::VertexAi => {
                settings.gcp_project = non_empty_env("GOOGLE_CLOUD_PROJECT");
                settings.location = non_empty_env("GOOGLE_CLOUD_LOCATION");
            }
            ProviderId::OpenRouter => {
                settings.referer = non_empty_env("OPENROUTER_REFERER");
                settings.app_title = non_empty_env("OPENROUTER_APP_TITLE");
            }
            _ => {}
        }
        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cost_tracking(mut self, enabled: bool) -> Self {
        self.track_costs = enabled;
        self
    }

    pub fn with_batching(mut self, max_batch_size: usize) -> Self {
        self.batch = Some(BatchConfig { max_batch_size });
        self
    }

    pub fn with_settings(mut self, settings: ProviderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub(crate) fn api_key_str(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Mask a credential for logs: keep the first and last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
