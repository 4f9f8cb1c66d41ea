//! Groq (OpenAI-compatible, LPU inference).

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, ModelDescriptor};

const FAST: &[Feature] = &[Feature::Streaming, Feature::ToolCalls, Feature::JsonMode];

static MODELS: [ModelDescriptor; 5] = [
    ModelDescriptor::text("llama-3.3-70b-versatile", "Llama 3.3 70B Versatile")
        .with_limits(131_072, 32_768)
        .with_pricing(0.59, 0.79)
        .with_features(FAST)
        .with_family("llama-3.3"),
    ModelDescriptor::text("llama-3.1-8b-instant", "Llama 3.1 8B Instant")
        .with_limits(131_072, 131_072)
        .with_pricing(0.05, 0.08)
        .with_features(FAST)
        .with_family("llama-3.1"),
    ModelDescriptor::text("gemma2-9b-it", "Gemma 2 9B")
        .with_limits(8_192, 8_192)
        .with_pricing(0.2, 0.2)
        .with_features(&[Feature::Streaming, Feature::JsonMode])
        .with_family("gemma-2"),
    ModelDescriptor::text("deepseek-r1-distill-llama-70b", "DeepSeek R1 Distill Llama 70B")
        .with_limits(131_072, 131_072)
        .with_pricing(0.75, 0.99)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::Reasoning])
        .with_family("deepseek-r1"),
    ModelDescriptor::text("qwen-qwq-32b", "Qwen QwQ 32B")
        .with_limits(131_072, 131_072)
        .with_pricing(0.29, 0.39)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::Reasoning])
        .with_family("qwen"),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Groq,
    display_name: "Groq",
    category: ProviderCategory::HighPerformance,
    base_url: BaseUrl::Fixed("https://api.groq.com/openai/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["GROQ_API_KEY"],
    requires_key: true,
    // Groq rejects temperature 0 for some models; 1e-8 is its documented floor.
    limits: ParamLimits::OPENAI.with_temperature(1e-8, 2.0),
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[])
}
