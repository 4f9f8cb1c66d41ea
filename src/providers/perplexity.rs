//! Perplexity: search-grounded chat with citations.

use super::{
    AuthScheme, BaseUrl, Endpoint, ParamLimits, ProviderCategory, ProviderId, ProviderProfile,
    no_extra_headers, openai_compatible_route,
};
use crate::config::ProviderSettings;
use crate::types::{Feature, ModelDescriptor};

const SONAR: &[Feature] = &[Feature::Streaming, Feature::WebSearch, Feature::Citations];

static MODELS: [ModelDescriptor; 4] = [
    ModelDescriptor::text("sonar", "Sonar")
        .with_limits(127_072, 8_000)
        .with_pricing(1.0, 1.0)
        .with_features(SONAR)
        .with_family("sonar"),
    ModelDescriptor::text("sonar-pro", "Sonar Pro")
        .with_limits(200_000, 8_000)
        .with_pricing(3.0, 15.0)
        .with_features(SONAR)
        .with_family("sonar"),
    ModelDescriptor::text("sonar-reasoning", "Sonar Reasoning")
        .with_limits(127_072, 8_000)
        .with_pricing(1.0, 5.0)
        .with_features(&[
            Feature::Streaming,
            Feature::WebSearch,
            Feature::Citations,
            Feature::Reasoning,
        ])
        .with_family("sonar"),
    ModelDescriptor::text("r1-1776", "R1 1776")
        .with_limits(128_000, 8_000)
        .with_pricing(2.0, 8.0)
        .with_features(&[Feature::Streaming, Feature::Reasoning])
        .with_family("r1"),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Perplexity,
    display_name: "Perplexity",
    category: ProviderCategory::Specialized,
    base_url: BaseUrl::Fixed("https://api.perplexity.ai"),
    auth: AuthScheme::Bearer,
    api_key_env: &["PERPLEXITY_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI
        .with_temperature(0.0, 1.99)
        .with_top_k(0, 2048)
        .with_max_stop_sequences(None)
        .without_seed(),
    models: &MODELS,
    catalog: None,
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    openai_compatible_route(descriptor, &[])
}
