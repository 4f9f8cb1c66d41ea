//! Azure OpenAI. Model ids are deployment names.

use super::{
    AuthScheme, BaseUrl, Endpoint, ParamLimits, ProviderCategory, ProviderId, ProviderProfile,
    no_extra_headers, openai_compatible_route, required_setting,
};
use crate::config::ProviderSettings;
use crate::error::LlmError;
use crate::types::{Feature, Modality, ModelDescriptor};

const DEFAULT_API_VERSION: &str = "2024-10-21";

const CHAT: &[Feature] = &[
    Feature::Streaming,
    Feature::ToolCalls,
    Feature::Vision,
    Feature::JsonMode,
];

static MODELS: [ModelDescriptor; 5] = [
    ModelDescriptor::text("gpt-4o", "GPT-4o (Azure)")
        .with_limits(128_000, 16_384)
        .with_pricing(2.5, 10.0)
        .with_features(CHAT)
        .with_family("gpt-4o"),
    ModelDescriptor::text("gpt-4o-mini", "GPT-4o mini (Azure)")
        .with_limits(128_000, 16_384)
        .with_pricing(0.165, 0.66)
        .with_features(CHAT)
        .with_family("gpt-4o"),
    ModelDescriptor::text("gpt-35-turbo", "GPT-3.5 Turbo (Azure)")
        .with_limits(16_385, 4_096)
        .with_pricing(0.5, 1.5)
        .with_features(&[Feature::Streaming, Feature::ToolCalls])
        .with_family("gpt-3.5"),
    ModelDescriptor::text("o3-mini", "o3-mini (Azure)")
        .with_limits(200_000, 100_000)
        .with_pricing(1.1, 4.4)
        .with_features(&[Feature::Streaming, Feature::ToolCalls, Feature::Reasoning])
        .with_family("o-series"),
    ModelDescriptor::text("text-embedding-3-small", "Text Embedding 3 Small (Azure)")
        .with_limits(8_191, 0)
        .with_pricing(0.022, 0.0)
        .with_modality(Modality::Embedding),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::AzureOpenAi,
    display_name: "Azure OpenAI",
    category: ProviderCategory::Cloud,
    base_url: BaseUrl::Derived(base_url),
    auth: AuthScheme::Header("api-key"),
    api_key_env: &["AZURE_OPENAI_API_KEY"],
    requires_key: true,
    limits: ParamLimits::OPENAI,
    models: &MODELS,
    catalog: None,
    stream_usage: true,
    route,
    extra_headers: no_extra_headers,
};

fn base_url(settings: &ProviderSettings) -> Result<String, LlmError> {
    let resource = required_setting(&settings.resource, "Azure OpenAI", "a resource name")?;
    Ok(format!("https://{resource}.openai.azure.com/openai"))
}

fn route(descriptor: &ModelDescriptor, _stream: bool, settings: &ProviderSettings) -> Option<Endpoint> {
    let endpoint = openai_compatible_route(descriptor, &[Modality::Embedding, Modality::Image])?;
    let api_version = settings.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION);
    Some(Endpoint::new(
        endpoint.format,
        format!(
            "/deployments/{}{}?api-version={}",
            urlencoding::encode(&descriptor.id),
            endpoint.path,
            urlencoding::encode(api_version)
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_path_carries_api_version() {
        let settings = ProviderSettings {
            api_version: Some("2025-01-01-preview".into()),
            ..Default::default()
        };
        let endpoint = PROFILE.route(&MODELS[0], false, &settings).unwrap();
        assert_eq!(
            endpoint.path,
            "/deployments/gpt-4o/chat/completions?api-version=2025-01-01-preview"
        );
    }

    #[test]
    fn missing_resource_is_a_configuration_error() {
        let err = PROFILE.resolve_base_url(&ProviderSettings::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
