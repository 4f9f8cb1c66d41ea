//! Together AI.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, Modality, ModelDescriptor};

static MODELS: [ModelDescriptor; 7] = [
    ModelDescriptor::text("meta-llama/Llama-3.3-70B-Instruct-Turbo", "Llama 3.3 70B Instruct Turbo")
        .with_limits(131_072, 8_192)
        .with_pricing(0.88, 0.88)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::JsonMode])
        .with_family("llama-3.3"),
    ModelDescriptor::text("meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo", "Llama 3.1 8B Instruct Turbo")
        .with_limits(131_072, 8_192)
        .with_pricing(0.18, 0.18)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::JsonMode])
        .with_family("llama-3.1"),
    ModelDescriptor::text("Qwen/Qwen2.5-72B-Instruct-Turbo", "Qwen 2.5 72B Instruct Turbo")
        .with_limits(32_768, 8_192)
        .with_pricing(1.2, 1.2)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::Multilingual])
        .with_family("qwen-2.5"),
    ModelDescriptor::text("deepseek-ai/DeepSeek-R1", "DeepSeek R1")
        .with_limits(163_840, 32_768)
        .with_pricing(3.0, 7.0)
        .with_features(&[Feature::Streaming, Feature::Reasoning])
        .with_family("deepseek-r1"),
    ModelDescriptor::text("BAAI/bge-large-en-v1.5", "BGE Large EN v1.5")
        .with_limits(512, 0)
        .with_pricing(0.02, 0.0)
        .with_modality(Modality::Embedding),
    ModelDescriptor::text("Salesforce/Llama-Rank-V1", "LlamaRank")
        .with_limits(8_192, 0)
        .with_pricing(0.1, 0.0)
        .with_modality(Modality::Rerank),
    ModelDescriptor::text("black-forest-labs/FLUX.1-schnell", "FLUX.1 schnell")
        .with_modality(Modality::Image),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Together,
    display_name: "Together AI",
    category: ProviderCategory::OpenSource,
    base_url: BaseUrl::Fixed("https://api.together.xyz/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["TOGETHER_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI.with_top_k(1, 100).with_max_stop_sequences(None),
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(
        descriptor,
        &[Modality::Embedding, Modality::Rerank, Modality::Image],
    )
}
