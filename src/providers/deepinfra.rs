//! DeepInfra (OpenAI-compatible endpoint).

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, Modality, ModelDescriptor};

static MODELS: [ModelDescriptor; 4] = [
    ModelDescriptor::text("meta-llama/Llama-3.3-70B-Instruct", "Llama 3.3 70B Instruct")
        .with_limits(131_072, 16_384)
        .with_pricing(0.23, 0.4)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::JsonMode])
        .with_family("llama-3.3"),
    ModelDescriptor::text("mistralai/Mixtral-8x7B-Instruct-v0.1", "Mixtral 8x7B Instruct")
        .with_limits(32_768, 16_384)
        .with_pricing(0.24, 0.24)
        .with_features(&[Feature::Streaming, Feature::Multilingual])
        .with_family("mixtral"),
    ModelDescriptor::text("Qwen/Qwen2.5-72B-Instruct", "Qwen 2.5 72B Instruct")
        .with_limits(32_768, 16_384)
        .with_pricing(0.23, 0.4)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::Multilingual])
        .with_family("qwen-2.5"),
    ModelDescriptor::text("BAAI/bge-m3", "BGE M3")
        .with_limits(8_192, 0)
        .with_pricing(0.01, 0.0)
        .with_features(&[Feature::Multilingual])
        .with_modality(Modality::Embedding),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::DeepInfra,
    display_name: "DeepInfra",
    category: ProviderCategory::OpenSource,
    base_url: BaseUrl::Fixed("https://api.deepinfra.com/v1/openai"),
    auth: AuthScheme::Bearer,
    api_key_env: &["DEEPINFRA_API_KEY", "DEEPINFRA_TOKEN"],
    requires_key: true,
    limits: ParamLimits::OPENAI.with_top_k(0, 1000).with_max_stop_sequences(Some(16)),
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: true,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[Modality::Embedding])
}
