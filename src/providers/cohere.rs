//! Cohere: v2 chat, v1 generate, embed and rerank.

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers,
};
use crate::config::ProviderSettings;
use crate::standards::WireFormat;
use crate::types::{Feature, Modality, ModelDescriptor};

const COMMAND: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Multilingual,
    Feature::Citations,
    Feature::JsonMode,
];

static MODELS: [ModelDescriptor; 9] = [
    ModelDescriptor::text("command-a-03-2025", "Command A")
        .with_limits(256_000, 8_000)
        .with_pricing(2.5, 10.0)
        .with_features(COMMAND)
        .with_family("command-a"),
    ModelDescriptor::text("command-r-plus", "Command R+")
        .with_limits(128_000, 4_000)
        .with_pricing(2.5, 10.0)
        .with_features(COMMAND)
        .with_family("command-r"),
    ModelDescriptor::text("command-r", "Command R")
        .with_limits(128_000, 4_000)
        .with_pricing(0.5, 1.5)
        .with_features(COMMAND)
        .with_family("command-r"),
    ModelDescriptor::text("command-r7b-12-2024", "Command R7B")
        .with_limits(128_000, 4_000)
        .with_pricing(0.0375, 0.15)
        .with_features(COMMAND)
        .with_family("command-r"),
    ModelDescriptor::text("command", "Command")
        .with_limits(4_096, 4_000)
        .with_pricing(1.0, 2.0)
        .with_features(&[Feature::Streaming, Feature::RawCompletion])
        .with_family("command"),
    ModelDescriptor::text("command-light", "Command Light")
        .with_limits(4_096, 4_000)
        .with_pricing(0.3, 0.6)
        .with_features(&[Feature::Streaming, Feature::RawCompletion])
        .with_family("command"),
    ModelDescriptor::text("embed-english-v3.0", "Embed English v3")
        .with_limits(512, 0)
        .with_pricing(0.1, 0.0)
        .with_modality(Modality::Embedding),
    ModelDescriptor::text("embed-multilingual-v3.0", "Embed Multilingual v3")
        .with_limits(512, 0)
        .with_pricing(0.1, 0.0)
        .with_features(&[Feature::Multilingual])
        .with_modality(Modality::Embedding),
    // Priced per million search units ($2 per 1K searches).
    ModelDescriptor::text("rerank-english-v3.0", "Rerank English v3")
        .with_limits(4_096, 0)
        .with_pricing(2000.0, 0.0)
        .with_modality(Modality::Rerank),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Cohere,
    display_name: "Cohere",
    category: ProviderCategory::Enterprise,
    base_url: BaseUrl::Fixed("https://api.cohere.com"),
    auth: AuthScheme::Bearer,
    api_key_env: &["COHERE_API_KEY", "CO_API_KEY"],
    requires_key: true,
    limits: ParamLimits {
        temperature: Some((0.0, 1.0)),
        top_p: Some((0.01, 0.99)),
        top_k: Some((0, 500)),
        max_stop_sequences: Some(5),
        seed: true,
    },
    models: &MODELS,
    catalog: Some(("/v1/models", CatalogFormat::Cohere)),
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    let endpoint = match descriptor.modality {
        Modality::Text if descriptor.has(Feature::RawCompletion) => {
            Endpoint::new(WireFormat::CohereGenerate, "/v1/generate")
        }
        Modality::Text => Endpoint::new(WireFormat::CohereChat, "/v2/chat"),
        Modality::Embedding => Endpoint::new(WireFormat::CohereEmbed, "/v1/embed"),
        Modality::Rerank => Endpoint::new(WireFormat::CohereRerank, "/v1/rerank"),
        _ => return None,
    };
    Some(endpoint)
}
