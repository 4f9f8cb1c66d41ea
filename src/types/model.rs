//! Static model metadata.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Capability tag attached to a model descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Streaming,
    ToolCalls,
    Vision,
    Multilingual,
    JsonMode,
    Reasoning,
    WebSearch,
    Citations,
    /// Served through a flat-prompt completion endpoint instead of chat.
    RawCompletion,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Self::Streaming,
        Self::ToolCalls,
        Self::Vision,
        Self::Multilingual,
        Self::JsonMode,
        Self::Reasoning,
        Self::WebSearch,
        Self::Citations,
        Self::RawCompletion,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::ToolCalls => "tool-calls",
            Self::Vision => "vision",
            Self::Multilingual => "multilingual",
            Self::JsonMode => "json-mode",
            Self::Reasoning => "reasoning",
            Self::WebSearch => "web-search",
            Self::Citations => "citations",
            Self::RawCompletion => "raw-completion",
        }
    }
}

/// Kind of content a model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[default]
    Text,
    Embedding,
    Rerank,
    Image,
    Video,
    Speech,
}

impl Modality {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Embedding => "embedding",
            Self::Rerank => "rerank",
            Self::Image => "image",
            Self::Video => "video",
            Self::Speech => "speech",
        }
    }
}

/// Vendor list price, in currency units per one million billed units.
///
/// The billed unit depends on the modality: tokens for text and embeddings,
/// input characters for speech, search units for rerank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Pricing {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

/// Immutable per-model metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub id: Cow<'static, str>,
    pub name: Cow<'static, str>,
    pub context_window: u32,
    pub max_output: u32,
    pub pricing: Option<Pricing>,
    pub features: &'static [Feature],
    pub modality: Modality,
    pub family: Option<&'static str>,
}

impl ModelDescriptor {
    /// Text model with no pricing and no features; refine with the `with_*`
    /// methods.
    pub const fn text(id: &'static str, name: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            name: Cow::Borrowed(name),
            context_window: 0,
            max_output: 0,
            pricing: None,
            features: &[],
            modality: Modality::Text,
            family: None,
        }
    }

    pub const fn with_limits(mut self, context_window: u32, max_output: u32) -> Self {
        self.context_window = context_window;
        self.max_output = max_output;
        self
    }

    pub const fn with_pricing(mut self, input_per_million: f64, output_per_million: f64) -> Self {
        self.pricing = Some(Pricing::new(input_per_million, output_per_million));
        self
    }

    pub const fn with_features(mut self, features: &'static [Feature]) -> Self {
        self.features = features;
        self
    }

    pub const fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = modality;
        self
    }

    pub const fn with_family(mut self, family: &'static str) -> Self {
        self.family = Some(family);
        self
    }

    /// Sentinel for ids missing from the provider's table: no pricing, no
    /// features, text modality.
    pub fn unknown(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self {
            name: Cow::Owned(id.clone()),
            id: Cow::Owned(id),
            context_window: 0,
            max_output: 0,
            pricing: None,
            features: &[],
            modality: Modality::Text,
            family: None,
        }
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn is_unknown(&self) -> bool {
        self.pricing.is_none() && self.features.is_empty() && self.context_window == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_builder_composes() {
        const M: ModelDescriptor = ModelDescriptor::text("command-r", "Command R")
            .with_limits(128_000, 4_000)
            .with_pricing(0.5, 1.5)
            .with_features(&[Feature::Streaming, Feature::ToolCalls])
            .with_family("command");

        assert!(M.has(Feature::Streaming));
        assert!(!M.has(Feature::Vision));
        assert_eq!(M.pricing, Some(Pricing::new(0.5, 1.5)));
        assert!(!M.is_unknown());
    }

    #[test]
    fn unknown_sentinel_has_no_pricing() {
        let d = ModelDescriptor::unknown("unknown-model-xyz");
        assert_eq!(d.id, "unknown-model-xyz");
        assert!(d.pricing.is_none());
        assert!(d.features.is_empty());
        assert_eq!(d.modality, Modality::Text);
        assert!(d.is_unknown());
    }

    #[test]
    fn features_serialize_kebab_case() {
        let json = serde_json::to_string(&Feature::ToolCalls).unwrap();
        assert_eq!(json, "\"tool-calls\"");
    }
}
