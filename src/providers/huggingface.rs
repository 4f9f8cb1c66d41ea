//! Hugging Face serverless inference (text-generation-inference).
//!
//! The final TGI stream frame carries the full `generated_text`; that text is
//! authoritative for the `Final` event even when it differs from the
//! concatenated token chunks.

use super::{
    AuthScheme, BaseUrl, Endpoint, ParamLimits, ProviderCategory, ProviderId, ProviderProfile,
    no_extra_headers,
};
use crate::config::ProviderSettings;
use crate::standards::WireFormat;
use crate::types::{Feature, Modality, ModelDescriptor};

static MODELS: [ModelDescriptor; 4] = [
    ModelDescriptor::text("meta-llama/Meta-Llama-3-8B-Instruct", "Llama 3 8B Instruct")
        .with_limits(8_192, 2_048)
        .with_features(&[Feature::Streaming])
        .with_family("llama-3"),
    ModelDescriptor::text("mistralai/Mistral-7B-Instruct-v0.3", "Mistral 7B Instruct v0.3")
        .with_limits(32_768, 2_048)
        .with_features(&[Feature::Streaming])
        .with_family("mistral"),
    ModelDescriptor::text("HuggingFaceH4/zephyr-7b-beta", "Zephyr 7B beta")
        .with_limits(8_192, 2_048)
        .with_features(&[Feature::Streaming])
        .with_family("zephyr"),
    ModelDescriptor::text("bigcode/starcoder2-15b", "StarCoder2 15B")
        .with_limits(16_384, 2_048)
        .with_features(&[Feature::Streaming, Feature::RawCompletion])
        .with_family("starcoder"),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::HuggingFace,
    display_name: "Hugging Face",
    category: ProviderCategory::OpenSource,
    base_url: BaseUrl::Fixed("https://api-inference.huggingface.co"),
    auth: AuthScheme::Bearer,
    api_key_env: &["HF_TOKEN", "HUGGINGFACE_API_KEY"],
    requires_key: false,
    // TGI rejects temperature 0 and top_p 1.
    limits: ParamLimits {
        temperature: Some((0.01, 100.0)),
        top_p: Some((0.01, 0.99)),
        top_k: Some((1, 1000)),
        max_stop_sequences: Some(4),
        seed: true,
    },
    models: &MODELS,
    catalog: None,
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    match descriptor.modality {
        Modality::Text => Some(Endpoint::new(
            WireFormat::HuggingFaceTgi,
            format!("/models/{}", descriptor.id),
        )),
        _ => None,
    }
}
