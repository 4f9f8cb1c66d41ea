//! Fireworks AI.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, Modality, ModelDescriptor};

static MODELS: [ModelDescriptor; 4] = [
    ModelDescriptor::text("accounts/fireworks/models/llama-v3p3-70b-instruct", "Llama 3.3 70B Instruct")
        .with_limits(131_072, 16_384)
        .with_pricing(0.9, 0.9)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::JsonMode])
        .with_family("llama-3.3"),
    ModelDescriptor::text("accounts/fireworks/models/llama-v3p1-8b-instruct", "Llama 3.1 8B Instruct")
        .with_limits(131_072, 16_384)
        .with_pricing(0.2, 0.2)
        .with_features(&[Feature::Streaming, Feature::JsonMode])
        .with_family("llama-3.1"),
    ModelDescriptor::text("accounts/fireworks/models/qwen2p5-coder-32b-instruct", "Qwen 2.5 Coder 32B")
        .with_limits(32_768, 16_384)
        .with_pricing(0.9, 0.9)
        .with_features(&[Feature::Streaming, Feature::RawCompletion])
        .with_family("qwen-2.5"),
    ModelDescriptor::text("nomic-ai/nomic-embed-text-v1.5", "Nomic Embed Text v1.5")
        .with_limits(8_192, 0)
        .with_pricing(0.008, 0.0)
        .with_modality(Modality::Embedding),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Fireworks,
    display_name: "Fireworks AI",
    category: ProviderCategory::HighPerformance,
    base_url: BaseUrl::Fixed("https://api.fireworks.ai/inference/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["FIREWORKS_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI.with_top_k(1, 100),
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: true,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[Modality::Embedding])
}
