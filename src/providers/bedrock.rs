//! Amazon Bedrock through the Converse API with a Bedrock API key (bearer
//! token). Event-stream responses are not decoded, so no model here
//! advertises streaming and stream requests fall back to a single response.

use super::{
    AuthScheme, BaseUrl, Endpoint, ParamLimits, ProviderCategory, ProviderId, ProviderProfile,
    no_extra_headers,
};
use crate::config::ProviderSettings;
use crate::error::LlmError;
use crate::standards::WireFormat;
use crate::types::{Feature, Modality, ModelDescriptor};

const DEFAULT_REGION: &str = "us-east-1";

static MODELS: [ModelDescriptor; 6] = [
    ModelDescriptor::text("anthropic.claude-3-5-sonnet-20241022-v2:0", "Claude 3.5 Sonnet v2 (Bedrock)")
        .with_limits(200_000, 8_192)
        .with_pricing(3.0, 15.0)
        .with_features(&[Feature::ToolCalls, Feature::Vision])
        .with_family("claude-3.5"),
    ModelDescriptor::text("anthropic.claude-3-haiku-20240307-v1:0", "Claude 3 Haiku (Bedrock)")
        .with_limits(200_000, 4_096)
        .with_pricing(0.25, 1.25)
        .with_features(&[Feature::ToolCalls, Feature::Vision])
        .with_family("claude-3"),
    ModelDescriptor::text("meta.llama3-1-70b-instruct-v1:0", "Llama 3.1 70B Instruct (Bedrock)")
        .with_limits(128_000, 2_048)
        .with_pricing(0.72, 0.72)
        .with_features(&[Feature::ToolCalls])
        .with_family("llama-3.1"),
    ModelDescriptor::text("amazon.nova-pro-v1:0", "Amazon Nova Pro")
        .with_limits(300_000, 5_000)
        .with_pricing(0.8, 3.2)
        .with_features(&[Feature::ToolCalls, Feature::Vision, Feature::Multilingual])
        .with_family("nova"),
    ModelDescriptor::text("amazon.nova-lite-v1:0", "Amazon Nova Lite")
        .with_limits(300_000, 5_000)
        .with_pricing(0.06, 0.24)
        .with_features(&[Feature::ToolCalls, Feature::Vision, Feature::Multilingual])
        .with_family("nova"),
    ModelDescriptor::text("amazon.titan-embed-text-v2:0", "Titan Text Embeddings v2")
        .with_limits(8_192, 0)
        .with_pricing(0.02, 0.0)
        .with_modality(Modality::Embedding),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Bedrock,
    display_name: "Amazon Bedrock",
    category: ProviderCategory::Cloud,
    base_url: BaseUrl::Derived(base_url),
    auth: AuthScheme::Bearer,
    api_key_env: &["AWS_BEARER_TOKEN_BEDROCK"],
    requires_key: true,
    limits: ParamLimits {
        temperature: Some((0.0, 1.0)),
        top_p: Some((0.0, 1.0)),
        top_k: Some((0, 500)),
        max_stop_sequences: Some(4),
        seed: false,
    },
    models: &MODELS,
    catalog: None,
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn base_url(settings: &ProviderSettings) -> Result<String, LlmError> {
    let region = settings.region.as_deref().unwrap_or(DEFAULT_REGION);
    Ok(format!("https://bedrock-runtime.{region}.amazonaws.com"))
}

fn route(descriptor: &ModelDescriptor, _stream: bool, _: &ProviderSettings) -> Option<Endpoint> {
    let model = urlencoding::encode(&descriptor.id);
    let endpoint = match descriptor.modality {
        Modality::Text => {
            Endpoint::new(WireFormat::BedrockConverse, format!("/model/{model}/converse"))
        }
        Modality::Embedding => {
            Endpoint::new(WireFormat::BedrockTitanEmbed, format!("/model/{model}/invoke"))
        }
        _ => return None,
    };
    Some(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_are_percent_encoded() {
        let endpoint = PROFILE
            .route(&MODELS[0], false, &ProviderSettings::default())
            .unwrap();
        assert_eq!(
            endpoint.path,
            "/model/anthropic.claude-3-5-sonnet-20241022-v2%3A0/converse"
        );
    }

    #[test]
    fn no_model_advertises_streaming() {
        assert!(MODELS.iter().all(|m| !m.has(Feature::Streaming)));
    }
}
