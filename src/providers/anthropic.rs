//! Anthropic Messages API.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile,
};
use crate::config::ProviderSettings;
use crate::standards::WireFormat;
use crate::types::{Feature, Modality, ModelDescriptor};

const DEFAULT_VERSION: &str = "2023-06-01";

const CLAUDE: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Vision,
    Feature::Multilingual,
];
const CLAUDE_THINKING: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Vision,
    Feature::Multilingual,
    Feature::Reasoning,
];

static MODELS: [ModelDescriptor; 6] = [
    ModelDescriptor::text("claude-sonnet-4-20250514", "Claude Sonnet 4")
        .with_limits(200_000, 64_000)
        .with_pricing(3.0, 15.0)
        .with_features(CLAUDE_THINKING)
        .with_family("claude-4"),
    ModelDescriptor::text("claude-opus-4-20250514", "Claude Opus 4")
        .with_limits(200_000, 32_000)
        .with_pricing(15.0, 75.0)
        .with_features(CLAUDE_THINKING)
        .with_family("claude-4"),
    ModelDescriptor::text("claude-3-7-sonnet-20250219", "Claude 3.7 Sonnet")
        .with_limits(200_000, 64_000)
        .with_pricing(3.0, 15.0)
        .with_features(CLAUDE_THINKING)
        .with_family("claude-3.7"),
    ModelDescriptor::text("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet")
        .with_limits(200_000, 8_192)
        .with_pricing(3.0, 15.0)
        .with_features(CLAUDE)
        .with_family("claude-3.5"),
    ModelDescriptor::text("claude-3-5-haiku-20241022", "Claude 3.5 Haiku")
        .with_limits(200_000, 8_192)
        .with_pricing(0.8, 4.0)
        .with_features(CLAUDE)
        .with_family("claude-3.5"),
    ModelDescriptor::text("claude-3-haiku-20240307", "Claude 3 Haiku")
        .with_limits(200_000, 4_096)
        .with_pricing(0.25, 1.25)
        .with_features(CLAUDE)
        .with_family("claude-3"),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Anthropic,
    display_name: "Anthropic",
    category: ProviderCategory::Frontier,
    base_url: BaseUrl::Fixed("https://api.anthropic.com/v1"),
    auth: AuthScheme::Header("x-api-key"),
    api_key_env: &["ANTHROPIC_API_KEY"],
    requires_key: true,
    limits: ParamLimits {
        temperature: Some((0.0, 1.0)),
        top_p: Some((0.0, 1.0)),
        top_k: Some((0, 500)),
        max_stop_sequences: None,
        seed: false,
    },
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::Anthropic)),
    stream_usage: false,
    route,
    extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    match descriptor.modality {
        Modality::Text => Some(Endpoint::new(WireFormat::AnthropicMessages, "/messages")),
        _ => None,
    }
}

fn extra_headers(settings: &ProviderSettings) -> Vec<(&'static str, String)> {
    let version = settings.api_version.as_deref().unwrap_or(DEFAULT_VERSION);
    vec![("anthropic-version", version.to_string())]
}
