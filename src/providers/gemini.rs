//! Google Gemini (Generative Language API).

use super::{
    AuthScheme, BaseUrl, CatalogFormat, Endpoint, ParamLimits, ProviderCategory, ProviderId,
    ProviderProfile, no_extra_headers,
};
use crate::config::ProviderSettings;
use crate::standards::WireFormat;
use crate::types::{Feature, Modality, ModelDescriptor};

pub(super) const GEMINI_FEATURES: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Vision,
    Feature::JsonMode,
    Feature::Multilingual,
];
pub(super) const GEMINI_THINKING: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Vision,
    Feature::JsonMode,
    Feature::Multilingual,
    Feature::Reasoning,
];

pub(super) const GEMINI_LIMITS: ParamLimits = ParamLimits {
    temperature: Some((0.0, 2.0)),
    top_p: Some((0.0, 1.0)),
    top_k: Some((1, 64)),
    max_stop_sequences: Some(5),
    seed: true,
};

static MODELS: [ModelDescriptor; 5] = [
    ModelDescriptor::text("gemini-2.5-pro", "Gemini 2.5 Pro")
        .with_limits(1_048_576, 65_536)
        .with_pricing(1.25, 10.0)
        .with_features(GEMINI_THINKING)
        .with_family("gemini-2.5"),
    ModelDescriptor::text("gemini-2.5-flash", "Gemini 2.5 Flash")
        .with_limits(1_048_576, 65_536)
        .with_pricing(0.3, 2.5)
        .with_features(GEMINI_THINKING)
        .with_family("gemini-2.5"),
    ModelDescriptor::text("gemini-2.0-flash", "Gemini 2.0 Flash")
        .with_limits(1_048_576, 8_192)
        .with_pricing(0.1, 0.4)
        .with_features(GEMINI_FEATURES)
        .with_family("gemini-2.0"),
    ModelDescriptor::text("gemini-1.5-flash", "Gemini 1.5 Flash")
        .with_limits(1_048_576, 8_192)
        .with_pricing(0.075, 0.3)
        .with_features(GEMINI_FEATURES)
        .with_family("gemini-1.5"),
    ModelDescriptor::text("text-embedding-004", "Text Embedding 004")
        .with_limits(2_048, 0)
        .with_modality(Modality::Embedding),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Gemini,
    display_name: "Google Gemini",
    category: ProviderCategory::Frontier,
    base_url: BaseUrl::Fixed("https://generativelanguage.googleapis.com/v1beta"),
    auth: AuthScheme::Header("x-goog-api-key"),
    api_key_env: &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
    requires_key: true,
    limits: GEMINI_LIMITS,
    models: &MODELS,
    catalog: Some(("/models", CatalogFormat::Gemini)),
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    let model = urlencoding::encode(&descriptor.id);
    let endpoint = match descriptor.modality {
        Modality::Text if stream => Endpoint::new(
            WireFormat::GeminiGenerate,
            format!("/models/{model}:streamGenerateContent?alt=sse"),
        ),
        Modality::Text => Endpoint::new(
            WireFormat::GeminiGenerate,
            format!("/models/{model}:generateContent"),
        ),
        Modality::Embedding => Endpoint::new(
            WireFormat::GeminiEmbed,
            format!("/models/{model}:batchEmbedContents"),
        ),
        _ => return None,
    };
    Some(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_uses_sse_endpoint() {
        let settings = ProviderSettings::default();
        let plain = PROFILE.route(&MODELS[2], false, &settings).unwrap();
        let streamed = PROFILE.route(&MODELS[2], true, &settings).unwrap();
        assert_eq!(plain.path, "/models/gemini-2.0-flash:generateContent");
        assert_eq!(
            streamed.path,
            "/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
        );
    }
}
