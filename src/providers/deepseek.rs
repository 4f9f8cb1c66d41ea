//! DeepSeek. `deepseek-reasoner` streams its chain of thought as
//! `reasoning_content`, surfaced in provider metadata.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, ModelDescriptor};

static MODELS: [ModelDescriptor; 2] = [
    ModelDescriptor::text("deepseek-chat", "DeepSeek V3")
        .with_limits(65_536, 8_192)
        .with_pricing(0.27, 1.1)
        .with_features(&[
            Feature::Streaming,
            Feature::ToolCalls,
            Feature::JsonMode,
            Feature::Multilingual,
        ])
        .with_family("deepseek-v3"),
    ModelDescriptor::text("deepseek-reasoner", "DeepSeek R1")
        .with_limits(65_536, 8_192)
        .with_pricing(0.55, 2.19)
        .with_features(&[Feature::Streaming, Feature::Reasoning, Feature::Multilingual])
        .with_family("deepseek-r1"),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::DeepSeek,
    display_name: "DeepSeek",
    category: ProviderCategory::Specialized,
    base_url: BaseUrl::Fixed("https://api.deepseek.com/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["DEEPSEEK_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI.with_max_stop_sequences(Some(16)).without_seed(),
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: true,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[])
}
