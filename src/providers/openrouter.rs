//! OpenRouter gateway. Model ids are `vendor/model`.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, ModelDescriptor};

const ROUTED: &[Feature] = &[Feature::Streaming, Feature::ToolCalls, Feature::Vision];

static MODELS: [ModelDescriptor; 5] = [
    ModelDescriptor::text("openai/gpt-4o", "GPT-4o (OpenRouter)")
        .with_limits(128_000, 16_384)
        .with_pricing(2.5, 10.0)
        .with_features(ROUTED)
        .with_family("gpt-4o"),
    ModelDescriptor::text("anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet (OpenRouter)")
        .with_limits(200_000, 8_192)
        .with_pricing(3.0, 15.0)
        .with_features(ROUTED)
        .with_family("claude-3.5"),
    ModelDescriptor::text("google/gemini-2.0-flash-001", "Gemini 2.0 Flash (OpenRouter)")
        .with_limits(1_048_576, 8_192)
        .with_pricing(0.1, 0.4)
        .with_features(ROUTED)
        .with_family("gemini-2.0"),
    ModelDescriptor::text("meta-llama/llama-3.3-70b-instruct", "Llama 3.3 70B (OpenRouter)")
        .with_limits(131_072, 16_384)
        .with_pricing(0.12, 0.3)
        .with_features(&[Feature::Streaming, Feature::ToolCalls])
        .with_family("llama-3.3"),
    ModelDescriptor::text("deepseek/deepseek-r1", "DeepSeek R1 (OpenRouter)")
        .with_limits(163_840, 32_768)
        .with_pricing(0.55, 2.19)
        .with_features(&[Feature::Streaming, Feature::Reasoning])
        .with_family("deepseek-r1"),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::OpenRouter,
    display_name: "OpenRouter",
    category: ProviderCategory::Gateway,
    base_url: BaseUrl::Fixed("https://openrouter.ai/api/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["OPENROUTER_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI.with_top_k(0, 1000).with_max_stop_sequences(None),
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: true,
    route,
    extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[])
}

fn extra_headers(settings: &ProviderSettings) -> Vec<(&'static str, String)> {
    let mut headers = Vec::new();
    if let Some(referer) = &settings.referer {
        headers.push(("HTTP-Referer", referer.clone()));
    }
    if let Some(title) = &settings.app_title {
        headers.push(("X-Title", title.clone()));
    }
    headers
}
