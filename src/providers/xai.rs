//! xAI Grok.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, Modality, ModelDescriptor};

static MODELS: [ModelDescriptor; 4] = [
    ModelDescriptor::text("grok-3", "Grok 3")
        .with_limits(131_072, 131_072)
        .with_pricing(3.0, 15.0)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::JsonMode])
        .with_family("grok-3"),
    ModelDescriptor::text("grok-3-mini", "Grok 3 Mini")
        .with_limits(131_072, 131_072)
        .with_pricing(0.3, 0.5)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::Reasoning])
        .with_family("grok-3"),
    ModelDescriptor::text("grok-2-vision-1212", "Grok 2 Vision")
        .with_limits(32_768, 32_768)
        .with_pricing(2.0, 10.0)
        .with_features(&[Feature::Streaming, Feature::Vision])
        .with_family("grok-2"),
    ModelDescriptor::text("grok-2-image-1212", "Grok 2 Image").with_modality(Modality::Image),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Xai,
    display_name: "xAI",
    category: ProviderCategory::Frontier,
    base_url: BaseUrl::Fixed("https://api.x.ai/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["XAI_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI,
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: true,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[Modality::Image])
}
