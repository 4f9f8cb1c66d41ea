//! Google Vertex AI publisher models. Authenticates with an OAuth access
//! token passed as the API key.

use super::gemini::{GEMINI_FEATURES, GEMINI_LIMITS, GEMINI_THINKING};
use super::{
    AuthScheme, BaseUrl, Endpoint, ProviderCategory, ProviderId, ProviderProfile,
    no_extra_headers, required_setting,
};
use crate::config::ProviderSettings;
use crate::error::LlmError;
use crate::standards::WireFormat;
use crate::types::{Modality, ModelDescriptor};

const DEFAULT_LOCATION: &str = "us-central1";

static MODELS: [ModelDescriptor; 4] = [
    ModelDescriptor::text("gemini-2.5-pro", "Gemini 2.5 Pro (Vertex)")
        .with_limits(1_048_576, 65_536)
        .with_pricing(1.25, 10.0)
        .with_features(GEMINI_THINKING)
        .with_family("gemini-2.5"),
    ModelDescriptor::text("gemini-2.5-flash", "Gemini 2.5 Flash (Vertex)")
        .with_limits(1_048_576, 65_536)
        .with_pricing(0.3, 2.5)
        .with_features(GEMINI_THINKING)
        .with_family("gemini-2.5"),
    ModelDescriptor::text("gemini-2.0-flash-001", "Gemini 2.0 Flash (Vertex)")
        .with_limits(1_048_576, 8_192)
        .with_pricing(0.15, 0.6)
        .with_features(GEMINI_FEATURES)
        .with_family("gemini-2.0"),
    ModelDescriptor::text("text-embedding-005", "Text Embedding 005 (Vertex)")
        .with_limits(2_048, 0)
        .with_pricing(0.025, 0.0)
        .with_modality(Modality::Embedding),
];

pub(super) static PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::VertexAi,
    display_name: "Google Vertex AI",
    category: ProviderCategory::Cloud,
    base_url: BaseUrl::Derived(base_url),
    auth: AuthScheme::Bearer,
    api_key_env: &["GOOGLE_VERTEX_ACCESS_TOKEN", "GOOGLE_CLOUD_ACCESS_TOKEN"],
    requires_key: true,
    limits: GEMINI_LIMITS,
    models: &MODELS,
    catalog: None,
    stream_usage: false,
    route,
    extra_headers: no_extra_headers,
};

fn base_url(settings: &ProviderSettings) -> Result<String, LlmError> {
    let project = required_setting(&settings.gcp_project, "Vertex AI", "a Google Cloud project")?;
    let location = settings.location.as_deref().unwrap_or(DEFAULT_LOCATION);
    let host = if location == "global" {
        "aiplatform.googleapis.com".to_string()
    } else {
        format!("{location}-aiplatform.googleapis.com")
    };
    Ok(format!(
        "https://{host}/v1/projects/{project}/locations/{location}/publishers/google"
    ))
}

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
        Modality::Embedding => {
            Endpoint::new(WireFormat::VertexEmbed, format!("/models/{model}:predict"))
        }
        _ => return None,
    };
    Some(endpoint)
}
