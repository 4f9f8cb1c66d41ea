//! OpenAI.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, Modality, ModelDescriptor};

const CHAT: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Vision,
    Feature::JsonMode,
    Feature::Multilingual,
];
const REASONING: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Vision,
    Feature::JsonMode,
    Feature::Reasoning,
];

static MODELS: [ModelDescriptor; 14] = [
    ModelDescriptor::text("gpt-4o", "GPT-4o")
        .with_limits(128_000, 16_384)
        .with_pricing(2.5, 10.0)
        .with_features(CHAT)
        .with_family("gpt-4o"),
    ModelDescriptor::text("gpt-4o-mini", "GPT-4o mini")
        .with_limits(128_000, 16_384)
        .with_pricing(0.15, 0.6)
        .with_features(CHAT)
        .with_family("gpt-4o"),
    ModelDescriptor::text("gpt-4.1", "GPT-4.1")
        .with_limits(1_047_576, 32_768)
        .with_pricing(2.0, 8.0)
        .with_features(CHAT)
        .with_family("gpt-4.1"),
    ModelDescriptor::text("gpt-4.1-mini", "GPT-4.1 mini")
        .with_limits(1_047_576, 32_768)
        .with_pricing(0.4, 1.6)
        .with_features(CHAT)
        .with_family("gpt-4.1"),
    ModelDescriptor::text("gpt-4-turbo", "GPT-4 Turbo")
        .with_limits(128_000, 4_096)
        .with_pricing(10.0, 30.0)
        .with_features(CHAT)
        .with_family("gpt-4"),
    ModelDescriptor::text("gpt-3.5-turbo", "GPT-3.5 Turbo")
        .with_limits(16_385, 4_096)
        .with_pricing(0.5, 1.5)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::JsonMode])
        .with_family("gpt-3.5"),
    ModelDescriptor::text("gpt-3.5-turbo-instruct", "GPT-3.5 Turbo Instruct")
        .with_limits(4_096, 4_096)
        .with_pricing(1.5, 2.0)
        .with_features(&[Feature::Streaming, Feature::RawCompletion])
        .with_family("gpt-3.5"),
    ModelDescriptor::text("o3-mini", "o3-mini")
        .with_limits(200_000, 100_000)
        .with_pricing(1.1, 4.4)
        .with_features(REASONING)
        .with_family("o-series"),
    ModelDescriptor::text("o1", "o1")
        .with_limits(200_000, 100_000)
        .with_pricing(15.0, 60.0)
        .with_features(REASONING)
        .with_family("o-series"),
    ModelDescriptor::text("text-embedding-3-small", "Text Embedding 3 Small")
        .with_limits(8_191, 0)
        .with_pricing(0.02, 0.0)
        .with_modality(Modality::Embedding),
    ModelDescriptor::text("text-embedding-3-large", "Text Embedding 3 Large")
        .with_limits(8_191, 0)
        .with_pricing(0.13, 0.0)
        .with_modality(Modality::Embedding),
    ModelDescriptor::text("gpt-image-1", "GPT Image 1")
        .with_pricing(5.0, 40.0)
        .with_modality(Modality::Image),
    // Rate is per million input characters.
    ModelDescriptor::text("tts-1", "TTS 1")
        .with_limits(4_096, 0)
        .with_pricing(15.0, 0.0)
        .with_modality(Modality::Speech),
    ModelDescriptor::text("sora-2", "Sora 2").with_modality(Modality::Video),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::OpenAi,
    display_name: "OpenAI",
    category: ProviderCategory::Frontier,
    base_url: BaseUrl::Fixed("https://api.openai.com/v1"),
    auth: AuthScheme::Bearer,
    api_key_env: &["OPENAI_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI,
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::OpenAi)),
    stream_usage: true,
    route,
    extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(
        descriptor,
        &[Modality::Embedding, Modality::Image, Modality::Speech, Modality::Video],
    )
}

fn extra_headers(settings: &ProviderSettings) -> Vec<(&'static str, String)> {
    let mut headers = Vec::new();
    if let Some(org) = &settings.organization {
        headers.push(("OpenAI-Organization", org.clone()));
    }
    if let Some(project) = &settings.project {
        headers.push(("OpenAI-Project", project.clone()));
    }
    headers
}
