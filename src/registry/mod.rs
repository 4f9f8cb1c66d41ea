//! Adapter registry: name resolution and capability lookups across the
//! built-in providers.

use std::collections::{BTreeSet, HashMap};

use crate::adapter::Adapter;
use crate::config::AdapterConfig;
use crate::error::LlmError;
use crate::providers::{ProviderCategory, ProviderId};
use crate::types::{Feature, Modality};

/// Alternate spellings accepted besides each provider's canonical name.
const BUILTIN_ALIASES: &[(&str, ProviderId)] = &[
    ("aws-bedrock", ProviderId::Bedrock),
    ("amazon-bedrock", ProviderId::Bedrock),
    ("azure", ProviderId::AzureOpenAi),
    ("azure-open-ai", ProviderId::AzureOpenAi),
    ("open-ai", ProviderId::OpenAi),
    ("claude", ProviderId::Anthropic),
    ("google", ProviderId::Gemini),
    ("google-ai", ProviderId::Gemini),
    ("google-gemini", ProviderId::Gemini),
    ("vertex", ProviderId::VertexAi),
    ("google-vertex", ProviderId::VertexAi),
    ("vertexai", ProviderId::VertexAi),
    ("together-ai", ProviderId::Together),
    ("togetherai", ProviderId::Together),
    ("hf", ProviderId::HuggingFace),
    ("hugging-face", ProviderId::HuggingFace),
    ("fireworks-ai", ProviderId::Fireworks),
    ("mistral-ai", ProviderId::Mistral),
    ("mistralai", ProviderId::Mistral),
    ("deep-infra", ProviderId::DeepInfra),
    ("open-router", ProviderId::OpenRouter),
    ("deep-seek", ProviderId::DeepSeek),
    ("grok", ProviderId::Xai),
    ("x-ai", ProviderId::Xai),
    ("co", ProviderId::Cohere),
];

/// Lowercase, trim, and fold `_`, `.` and whitespace runs into `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.trim().chars() {
        if ch == '_' || ch == '-' || ch == '.' || ch.is_whitespace() {
            pending_dash = !out.is_empty();
        } else {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Resolves provider names to adapter classes ([`ProviderId`]) and answers
/// capability queries over the static tables.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    names: HashMap<String, ProviderId>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AdapterRegistry {
    /// Every built-in provider under its canonical name and aliases.
    pub fn builtin() -> Self {
        let mut names: HashMap<String, ProviderId> = ProviderId::ALL
            .iter()
            .map(|&id| (id.as_str().to_string(), id))
            .collect();
        for &(alias, id) in BUILTIN_ALIASES {
            names.insert(normalize_name(alias), id);
        }
        Self { names }
    }

    /// Accept `alias` as another name for `provider`.
    pub fn register_alias(&mut self, alias: &str, provider: ProviderId) -> Result<(), LlmError> {
        let key = normalize_name(alias);
        if key.is_empty() {
            return Err(LlmError::validation("provider alias must not be empty"));
        }
        self.names.insert(key, provider);
        Ok(())
    }

    /// Resolve `name`; unknown names list every canonical provider name.
    pub fn get_adapter(&self, name: &str) -> Result<ProviderId, LlmError> {
        self.names
            .get(&normalize_name(name))
            .copied()
            .ok_or_else(|| LlmError::UnsupportedProviderError {
                name: name.to_string(),
                known: self.known_names(),
            })
    }

    /// Resolve `name` and construct its adapter.
    pub fn create_adapter(&self, name: &str, config: AdapterConfig) -> Result<Adapter, LlmError> {
        let provider = self.get_adapter(name)?;
        tracing::debug!(requested = name, provider = %provider, "creating adapter");
        Adapter::new(provider, config)
    }

    /// Canonical names, sorted.
    pub fn known_names(&self) -> Vec<String> {
        let canonical: BTreeSet<&'static str> = self.names.values().map(|id| id.as_str()).collect();
        canonical.into_iter().map(str::to_string).collect()
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        let set: BTreeSet<ProviderId> = self.names.values().copied().collect();
        set.into_iter().collect()
    }

    /// Providers with at least one model offering `feature`.
    pub fn get_providers_by_feature(&self, feature: Feature) -> Vec<ProviderId> {
        self.filter(|id| id.profile().supports(feature))
    }

    pub fn get_providers_by_category(&self, category: ProviderCategory) -> Vec<ProviderId> {
        self.filter(|id| id.category() == category)
    }

    /// Providers with at least one model of `modality`.
    pub fn get_providers_by_modality(&self, modality: Modality) -> Vec<ProviderId> {
        self.filter(|id| id.profile().serves(modality))
    }

    fn filter(&self, keep: impl Fn(ProviderId) -> bool) -> Vec<ProviderId> {
        self.providers().into_iter().filter(|&id| keep(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_folds_case_and_separators() {
        assert_eq!(normalize_name("  AWS_Bedrock "), "aws-bedrock");
        assert_eq!(normalize_name("Vertex.AI"), "vertex-ai");
        assert_eq!(normalize_name("hugging  face"), "hugging-face");
        assert_eq!(normalize_name("--openai--"), "openai");
    }

    #[test]
    fn every_canonical_name_round_trips() {
        let registry = AdapterRegistry::builtin();
        for id in ProviderId::ALL {
            assert_eq!(registry.get_adapter(id.as_str()).unwrap(), id);
        }
    }

    #[test]
    fn known_names_are_canonical_and_sorted() {
        let names = AdapterRegistry::builtin().known_names();
        assert_eq!(names.len(), ProviderId::ALL.len());
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(!names.contains(&"claude".to_string()));
    }

    #[test]
    fn custom_alias() {
        let mut registry = AdapterRegistry::builtin();
        registry.register_alias("My Gateway", ProviderId::OpenRouter).unwrap();
        assert_eq!(registry.get_adapter("my_gateway").unwrap(), ProviderId::OpenRouter);
        assert!(registry.register_alias(" _ ", ProviderId::OpenAi).is_err());
    }
}
