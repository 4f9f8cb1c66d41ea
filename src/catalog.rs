//! Model registry: static descriptor lookup plus parsing of live model
//! listings.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use serde_json::Value;

use crate::providers::{CatalogFormat, ProviderId};
use crate::types::{Modality, ModelDescriptor};

type ModelIndex = HashMap<ProviderId, HashMap<&'static str, &'static ModelDescriptor>>;

fn index() -> &'static ModelIndex {
    static INDEX: OnceLock<ModelIndex> = OnceLock::new();
    INDEX.get_or_init(|| {
        ProviderId::ALL
            .iter()
            .map(|&provider| {
                let models = provider
                    .profile()
                    .models
                    .iter()
                    .map(|m| (&*m.id, m))
                    .collect();
                (provider, models)
            })
            .collect()
    })
}

/// Static descriptor for `model_id`, if the provider's table has one.
pub fn lookup(provider: ProviderId, model_id: &str) -> Option<&'static ModelDescriptor> {
    index().get(&provider)?.get(model_id).copied()
}

/// Descriptor for `model_id`. Total: ids missing from the provider's table
/// yield [`ModelDescriptor::unknown`], which prices every call at zero.
pub fn describe(provider: ProviderId, model_id: &str) -> ModelDescriptor {
    lookup(provider, model_id)
        .cloned()
        .unwrap_or_else(|| ModelDescriptor::unknown(model_id))
}

/// Parse a vendor model listing into descriptors. Entries carry whatever
/// limits the listing reports and no pricing.
pub fn parse_model_catalog(format: CatalogFormat, body: &Value) -> Vec<ModelDescriptor> {
    match format {
        CatalogFormat::OpenAi | CatalogFormat::Anthropic => entries(body, "data")
            .filter_map(|entry| {
                let id = entry.get("id")?.as_str()?;
                let mut descriptor = ModelDescriptor::unknown(id);
                if let Some(name) = entry.get("display_name").and_then(Value::as_str) {
                    descriptor.name = Cow::Owned(name.to_string());
                }
                if let Some(window) = entry.get("context_length").and_then(Value::as_u64) {
                    descriptor.context_window = saturate(window);
                }
                Some(descriptor)
            })
            .collect(),
        CatalogFormat::Cohere => entries(body, "models")
            .filter_map(|entry| {
                let mut descriptor = ModelDescriptor::unknown(entry.get("name")?.as_str()?);
                if let Some(window) = entry.get("context_length").and_then(Value::as_u64) {
                    descriptor.context_window = saturate(window);
                }
                let endpoints = string_list(entry.get("endpoints"));
                if endpoints.contains(&"rerank") {
                    descriptor.modality = Modality::Rerank;
                } else if endpoints.contains(&"embed") && !endpoints.contains(&"chat") {
                    descriptor.modality = Modality::Embedding;
                }
                Some(descriptor)
            })
            .collect(),
        CatalogFormat::Gemini => entries(body, "models")
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?;
                let id = name.strip_prefix("models/").unwrap_or(name);
                let mut descriptor = ModelDescriptor::unknown(id);
                if let Some(display) = entry.get("displayName").and_then(Value::as_str) {
                    descriptor.name = Cow::Owned(display.to_string());
                }
                if let Some(limit) = entry.get("inputTokenLimit").and_then(Value::as_u64) {
                    descriptor.context_window = saturate(limit);
                }
                if let Some(limit) = entry.get("outputTokenLimit").and_then(Value::as_u64) {
                    descriptor.max_output = saturate(limit);
                }
                let methods = string_list(entry.get("supportedGenerationMethods"));
                if methods.contains(&"embedContent") && !methods.contains(&"generateContent") {
                    descriptor.modality = Modality::Embedding;
                }
                Some(descriptor)
            })
            .collect(),
    }
}

/// Static entries first, then live entries the static table lacks. Static
/// metadata wins on conflict.
pub fn merge(static_models: &[ModelDescriptor], live: Vec<ModelDescriptor>) -> Vec<ModelDescriptor> {
    let known: HashSet<&str> = static_models.iter().map(|m| &*m.id).collect();
    let mut merged = static_models.to_vec();
    let mut seen = HashSet::new();
    for model in live {
        if !known.contains(&*model.id) && seen.insert(model.id.clone()) {
            merged.push(model);
        }
    }
    merged
}

/// Listing entries under `key`; some vendors (Together) return a bare array.
fn entries<'v>(body: &'v Value, key: &str) -> impl Iterator<Item = &'v Value> {
    body.as_array()
        .or_else(|| body.get(key).and_then(Value::as_array))
        .into_iter()
        .flatten()
}

fn string_list(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
