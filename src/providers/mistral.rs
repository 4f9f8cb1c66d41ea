//! Mistral AI.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, Modality, ModelDescriptor};

const CHAT: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::JsonMode,
    Feature::Multilingual,
];

static MODELS: [ModelDescriptor; 5] = [
    ModelDescriptor::text("mistral-large-latest", "Mistral Large")
        .with_limits(131_072, 131_072)
        .with_pricing(2.0, 6.0)
        .with_features(CHAT)
        .with_family("mistral-large"),
    ModelDescriptor::text("mistral-small-latest", "Mistral Small")
        .with_limits(131_072, 131_072)
        .with_pricing(0.1, 0.3)
        .with_features(CHAT)
        .with_family("mistral-small"),
    ModelDescriptor::text("codestral-latest", "Codestral")
        .with_limits(256_000, 256_000)
        .with_pricing(0.3, 0.9)
        .with_features(&[Feature::Streaming, Feature::ToolCalls])
        .with_family("codestral"),
    ModelDescriptor::text("pixtral-large-latest", "Pixtral Large")
        .with_limits(131_072, 131_072)
        .with_pricing(2.0, 6.0)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::Vision])
        .with_family("pixtral"),
    ModelDescriptor::text("mistral-embed", "Mistral Embed")
        .with_limits(8_192, 0)
        .with_pricing(0.1, 0.0)
        .with_modality(Modality::Embedding),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Mistral,
    display_name: "Mistral AI",
    category: ProviderCategory::Enterprise,
    base_url: BaseUrl::Fixed("https://api.mistral.ai/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["MISTRAL_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI
        .with_temperature(0.0, 1.5)
        .with_max_stop_sequences(None),
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[Modality::Embedding])
}
