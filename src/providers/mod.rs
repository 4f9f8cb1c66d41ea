//! Built-in providers.
//!
//! Each provider module contributes a static [`ProviderProfile`]: its model
//! table, auth scheme, parameter limits, and a routing function that picks
//! the wire format and endpoint for a `(model modality, feature)` pair. The
//! normalizer and canonicalizer dispatch on the resulting
//! [`WireFormat`](crate::standards::WireFormat); there is no per-provider
//! subclassing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ProviderSettings;
use crate::error::LlmError;
use crate::standards::WireFormat;
use crate::types::{Feature, Modality, ModelDescriptor};

mod anthropic;
mod azure;
mod bedrock;
mod cohere;
mod deepinfra;
mod deepseek;
mod fireworks;
mod gemini;
mod groq;
mod huggingface;
mod mistral;
mod openai;
mod openrouter;
mod perplexity;
mod together;
mod vertex;
mod xai;

/// Identifier of a built-in provider. Doubles as the adapter "class" handed
/// out by the [`AdapterRegistry`](crate::AdapterRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    OpenAi,
    AzureOpenAi,
    Anthropic,
    Cohere,
    Groq,
    Mistral,
    Together,
    Fireworks,
    Perplexity,
    DeepInfra,
    OpenRouter,
    Bedrock,
    Gemini,
    VertexAi,
    HuggingFace,
    Xai,
    DeepSeek,
}

impl ProviderId {
    pub const ALL: [ProviderId; 17] = [
        Self::OpenAi,
        Self::AzureOpenAi,
        Self::Anthropic,
        Self::Cohere,
        Self::Groq,
        Self::Mistral,
        Self::Together,
        Self::Fireworks,
        Self::Perplexity,
        Self::DeepInfra,
        Self::OpenRouter,
        Self::Bedrock,
        Self::Gemini,
        Self::VertexAi,
        Self::HuggingFace,
        Self::Xai,
        Self::DeepSeek,
    ];

    /// Canonical registry name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::AzureOpenAi => "azure-openai",
            Self::Anthropic => "anthropic",
            Self::Cohere => "cohere",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::Together => "together",
            Self::Fireworks => "fireworks",
            Self::Perplexity => "perplexity",
            Self::DeepInfra => "deepinfra",
            Self::OpenRouter => "openrouter",
            Self::Bedrock => "bedrock",
            Self::Gemini => "gemini",
            Self::VertexAi => "vertex-ai",
            Self::HuggingFace => "huggingface",
            Self::Xai => "xai",
            Self::DeepSeek => "deepseek",
        }
    }

    pub fn profile(&self) -> &'static ProviderProfile {
        match self {
            Self::OpenAi => &openai::PROFILE,
            Self::AzureOpenAi => &azure::PROFILE,
            Self::Anthropic => &anthropic::PROFILE,
            Self::Cohere => &cohere::PROFILE,
            Self::Groq => &groq::PROFILE,
            Self::Mistral => &mistral::PROFILE,
            Self::Together => &together::PROFILE,
            Self::Fireworks => &fireworks::PROFILE,
            Self::Perplexity => &perplexity::PROFILE,
            Self::DeepInfra => &deepinfra::PROFILE,
            Self::OpenRouter => &openrouter::PROFILE,
            Self::Bedrock => &bedrock::PROFILE,
            Self::Gemini => &gemini::PROFILE,
            Self::VertexAi => &vertex::PROFILE,
            Self::HuggingFace => &huggingface::PROFILE,
            Self::Xai => &xai::PROFILE,
            Self::DeepSeek => &deepseek::PROFILE,
        }
    }

    pub fn category(&self) -> ProviderCategory {
        self.profile().category
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse market segment used by routers to filter candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderCategory {
    Frontier,
    Cloud,
    Enterprise,
    HighPerformance,
    Gateway,
    OpenSource,
    Specialized,
}

/// How the API key is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Raw key in a vendor header, e.g. `x-api-key`.
    Header(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub enum BaseUrl {
    Fixed(&'static str),
    /// Built from [`ProviderSettings`] (Azure resource, Bedrock region, ...).
    Derived(fn(&ProviderSettings) -> Result<String, LlmError>),
}

/// Ranges a provider accepts. `None` means the parameter is not accepted at
/// all and is dropped during normalization.
#[derive(Debug, Clone, Copy)]
pub struct ParamLimits {
    pub temperature: Option<(f64, f64)>,
    pub top_p: Option<(f64, f64)>,
    pub top_k: Option<(u32, u32)>,
    /// Maximum number of stop sequences, when the vendor caps it.
    pub max_stop_sequences: Option<usize>,
    pub seed: bool,
}

impl ParamLimits {
    /// OpenAI chat ranges; most compatible vendors reuse them.
    pub const OPENAI: ParamLimits = ParamLimits {
        temperature: Some((0.0, 2.0)),
        top_p: Some((0.0, 1.0)),
        top_k: None,
        max_stop_sequences: Some(4),
        seed: true,
    };

    pub const fn with_top_k(mut self, min: u32, max: u32) -> Self {
        self.top_k = Some((min, max));
        self
    }

    pub const fn with_temperature(mut self, min: f64, max: f64) -> Self {
        self.temperature = Some((min, max));
        self
    }

    pub const fn with_max_stop_sequences(mut self, max: Option<usize>) -> Self {
        self.max_stop_sequences = max;
        self
    }

    pub const fn without_seed(mut self) -> Self {
        self.seed = false;
        self
    }
}

/// Shape of a provider's live model listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// `{"data": [{"id": ...}]}`
    OpenAi,
    /// `{"data": [{"id": ..., "display_name": ...}]}`
    Anthropic,
    /// `{"models": [{"name": ..., "context_length": ...}]}`
    Cohere,
    /// `{"models": [{"name": "models/...", "displayName": ..., "inputTokenLimit": ...}]}`
    Gemini,
}

/// Wire format plus path relative to the base URL (query string included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub format: WireFormat,
    pub path: String,
}

impl Endpoint {
    pub fn new(format: WireFormat, path: impl Into<String>) -> Self {
        Self {
            format,
            path: path.into(),
        }
    }
}

type RouteFn = fn(&ModelDescriptor, bool, &ProviderSettings) -> Option<Endpoint>;
type HeaderFn = fn(&ProviderSettings) -> Vec<(&'static str, String)>;

/// Static description of one provider.
pub struct ProviderProfile {
    pub id: ProviderId,
    pub display_name: &'static str,
    pub category: ProviderCategory,
    pub base_url: BaseUrl,
    pub auth: AuthScheme,
    /// Environment variables checked in order by `AdapterConfig::from_env`.
    pub api_key_env: &'static [&'static str],
    pub requires_key: bool,
    pub limits: ParamLimits,
    pub models: &'static [ModelDescriptor],
    /// Live catalog path and shape, when the vendor exposes one.
    pub catalog: Option<(&'static str, CatalogFormat)>,
    /// OpenAI-style `stream_options.include_usage` is accepted.
    pub stream_usage: bool,
    route: RouteFn,
    extra_headers: HeaderFn,
}

impl fmt::Debug for ProviderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderProfile")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("models", &self.models.len())
            .finish_non_exhaustive()
    }
}

impl ProviderProfile {
    /// Endpoint for `descriptor`, or a validation error if this provider
    /// has no route for the model's modality.
    pub fn route(
        &self,
        descriptor: &ModelDescriptor,
        stream: bool,
        settings: &ProviderSettings,
    ) -> Result<Endpoint, LlmError> {
        (self.route)(descriptor, stream, settings).ok_or_else(|| {
            LlmError::validation(format!(
                "{} does not serve {} models ({})",
                self.display_name,
                descriptor.modality.as_str(),
                descriptor.id
            ))
        })
    }

    pub fn resolve_base_url(&self, settings: &ProviderSettings) -> Result<String, LlmError> {
        match self.base_url {
            BaseUrl::Fixed(url) => Ok(url.to_string()),
            BaseUrl::Derived(build) => build(settings),
        }
    }

    pub fn extra_headers(&self, settings: &ProviderSettings) -> Vec<(&'static str, String)> {
        (self.extra_headers)(settings)
    }

    pub fn serves(&self, modality: Modality) -> bool {
        self.models.iter().any(|m| m.modality == modality)
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.models.iter().any(|m| m.has(feature))
    }
}

fn no_extra_headers(_: &ProviderSettings) -> Vec<(&'static str, String)> {
    Vec::new()
}

/// Routing shared by OpenAI-compatible vendors. `modalities` lists what the
/// vendor serves besides chat text.
fn openai_compatible_route(descriptor: &ModelDescriptor, modalities: &[Modality]) -> Option<Endpoint> {
    let modality = descriptor.modality;
    if modality != Modality::Text && !modalities.contains(&modality) {
        return None;
    }
    let endpoint = match modality {
        Modality::Text if descriptor.has(Feature::RawCompletion) => {
            Endpoint::new(WireFormat::OpenAiCompletion, "/completions")
        }
        Modality::Text => Endpoint::new(WireFormat::OpenAiChat, "/chat/completions"),
        Modality::Embedding => Endpoint::new(WireFormat::OpenAiEmbedding, "/embeddings"),
        Modality::Image => Endpoint::new(WireFormat::OpenAiImage, "/images/generations"),
        Modality::Speech => Endpoint::new(WireFormat::OpenAiSpeech, "/audio/speech"),
        Modality::Video => Endpoint::new(WireFormat::OpenAiVideo, "/videos"),
        Modality::Rerank => Endpoint::new(WireFormat::CohereRerank, "/rerank"),
    };
    Some(endpoint)
}

fn required_setting<'a>(
    value: &'a Option<String>,
    provider: &str,
    what: &str,
) -> Result<&'a str, LlmError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LlmError::ConfigurationError(format!("{provider} requires {what}")))
}
