//! Wire formats: request normalization, response canonicalization and
//! stream frame mapping.
//!
//! Each [`WireFormat`] variant names one vendor JSON schema. Providers pick a
//! format per model through their routing table; everything downstream
//! dispatches on the format, so several providers share one implementation
//! (every OpenAI-compatible vendor, Gemini and Vertex AI, Cohere and
//! Together rerank).

use serde_json::{Map, Value};

use crate::config::ProviderSettings;
use crate::cost;
use crate::error::LlmError;
use crate::providers::{Endpoint, ParamLimits, ProviderId};
use crate::types::{
    CompletionRequest, CompletionResponse, Feature, FinishReason, ModelDescriptor, ToolCall, Usage,
};

mod anthropic;
mod bedrock;
mod cohere;
mod gemini;
mod huggingface;
mod openai;

/// Closed set of vendor request/response schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    OpenAiChat,
    OpenAiCompletion,
    OpenAiEmbedding,
    OpenAiImage,
    OpenAiSpeech,
    OpenAiVideo,
    AnthropicMessages,
    /// Cohere v2 `/chat`.
    CohereChat,
    /// Cohere v1 `/generate`.
    CohereGenerate,
    CohereEmbed,
    /// Cohere v1 `/rerank`; Together serves the same schema.
    CohereRerank,
    GeminiGenerate,
    GeminiEmbed,
    VertexEmbed,
    BedrockConverse,
    BedrockTitanEmbed,
    HuggingFaceTgi,
}

impl WireFormat {
    /// Whether a streaming variant of this endpoint is decoded.
    pub const fn supports_streaming(&self) -> bool {
        matches!(
            self,
            Self::OpenAiChat
                | Self::OpenAiCompletion
                | Self::AnthropicMessages
                | Self::CohereChat
                | Self::CohereGenerate
                | Self::GeminiGenerate
                | Self::HuggingFaceTgi
        )
    }

    /// Payload keys the canonical request owns; passthrough options never
    /// override them.
    pub const fn core_keys(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAiChat => &["model", "messages", "stream", "stream_options", "tools"],
            Self::OpenAiCompletion => &["model", "prompt", "stream", "stream_options"],
            Self::OpenAiEmbedding => &["model", "input"],
            Self::OpenAiImage | Self::OpenAiVideo => &["model", "prompt"],
            Self::OpenAiSpeech => &["model", "input"],
            Self::AnthropicMessages => &["model", "messages", "system", "stream", "tools"],
            Self::CohereChat => &["model", "messages", "stream", "tools"],
            Self::CohereGenerate => &["model", "prompt", "stream"],
            Self::CohereEmbed => &["model", "texts"],
            Self::CohereRerank => &["model", "query", "documents"],
            Self::GeminiGenerate => &["contents", "systemInstruction", "tools"],
            Self::GeminiEmbed => &["requests"],
            Self::VertexEmbed => &["instances"],
            Self::BedrockConverse => &["messages", "system", "toolConfig"],
            Self::BedrockTitanEmbed => &["inputText"],
            Self::HuggingFaceTgi => &["inputs", "stream"],
        }
    }
}

/// A canonical request rendered for one vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    pub endpoint: Endpoint,
    pub payload: Value,
    /// Whether the payload asks for a streamed response.
    pub stream: bool,
}

/// Everything the canonicalizer needs besides the body.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub provider: ProviderId,
    pub descriptor: &'a ModelDescriptor,
    pub request: &'a CompletionRequest,
}

/// Render `request` for `provider`.
///
/// Sampling values outside the provider's accepted range are clamped;
/// parameters the provider does not accept are dropped with a debug log.
/// Stop sequences are never dropped: exceeding the provider's cap is a
/// validation error, as are tools against a model without tool calling.
pub fn build_request(
    request: &CompletionRequest,
    descriptor: &ModelDescriptor,
    provider: ProviderId,
    settings: &ProviderSettings,
) -> Result<NormalizedRequest, LlmError> {
    let profile = provider.profile();

    if !request.tools.is_empty() && !descriptor.has(Feature::ToolCalls) {
        return Err(LlmError::validation(format!(
            "model '{}' on {} does not support tool calls",
            descriptor.id, profile.display_name
        )));
    }

    let wants_stream = request.stream && descriptor.has(Feature::Streaming);
    let mut endpoint = profile.route(descriptor, wants_stream, settings)?;
    let stream = wants_stream && endpoint.format.supports_streaming();
    if wants_stream && !stream {
        endpoint = profile.route(descriptor, false, settings)?;
    }

    let sampling = Sampling::resolve(provider, descriptor, &profile.limits, request)?;
    let input = BuildInput {
        provider,
        descriptor,
        request,
        sampling: &sampling,
        stream,
        stream_usage: profile.stream_usage,
    };

    let mut payload = match endpoint.format {
        WireFormat::OpenAiChat => openai::chat_request(&input),
        WireFormat::OpenAiCompletion => openai::completion_request(&input),
        WireFormat::OpenAiEmbedding => openai::embedding_request(&input),
        WireFormat::OpenAiImage => openai::image_request(&input),
        WireFormat::OpenAiSpeech => openai::speech_request(&input),
        WireFormat::OpenAiVideo => openai::video_request(&input),
        WireFormat::AnthropicMessages => anthropic::messages_request(&input),
        WireFormat::CohereChat => cohere::chat_request(&input),
        WireFormat::CohereGenerate => cohere::generate_request(&input),
        WireFormat::CohereEmbed => cohere::embed_request(&input),
        WireFormat::CohereRerank => cohere::rerank_request(&input)?,
        WireFormat::GeminiGenerate => gemini::generate_request(&input),
        WireFormat::GeminiEmbed => gemini::embed_request(&input),
        WireFormat::VertexEmbed => gemini::vertex_embed_request(&input),
        WireFormat::BedrockConverse => bedrock::converse_request(&input),
        WireFormat::BedrockTitanEmbed => bedrock::titan_embed_request(&input)?,
        WireFormat::HuggingFaceTgi => huggingface::tgi_request(&input),
    };

    merge_provider_options(
        &mut payload,
        &request.provider_options,
        endpoint.format.core_keys(),
    );

    Ok(NormalizedRequest {
        endpoint,
        payload,
        stream,
    })
}

/// Turn a complete (non-streaming) response body into the canonical final
/// response, cost included.
pub fn canonicalize(
    format: WireFormat,
    body: &[u8],
    ctx: &ResponseContext<'_>,
) -> Result<CompletionResponse, LlmError> {
    let json = || -> Result<Value, LlmError> {
        serde_json::from_slice(body).map_err(|e| {
            LlmError::ParseError(format!(
                "{} returned a non-JSON body: {e}",
                ctx.provider.profile().display_name
            ))
        })
    };

    let mut response = match format {
        WireFormat::OpenAiSpeech => openai::speech_response(body, ctx),
        WireFormat::OpenAiChat => openai::chat_response(&json()?),
        WireFormat::OpenAiCompletion => openai::completion_response(&json()?),
        WireFormat::OpenAiEmbedding => openai::embedding_response(&json()?),
        WireFormat::OpenAiImage => openai::image_response(&json()?),
        WireFormat::OpenAiVideo => openai::video_response(&json()?),
        WireFormat::AnthropicMessages => anthropic::messages_response(&json()?),
        WireFormat::CohereChat => cohere::chat_response(&json()?),
        WireFormat::CohereGenerate => cohere::generate_response(&json()?),
        WireFormat::CohereEmbed => cohere::embed_response(&json()?),
        WireFormat::CohereRerank => cohere::rerank_response(&json()?),
        WireFormat::GeminiGenerate => gemini::generate_response(&json()?),
        WireFormat::GeminiEmbed => gemini::embed_response(&json()?),
        WireFormat::VertexEmbed => gemini::vertex_embed_response(&json()?),
        WireFormat::BedrockConverse => bedrock::converse_response(&json()?),
        WireFormat::BedrockTitanEmbed => bedrock::titan_embed_response(&json()?),
        WireFormat::HuggingFaceTgi => huggingface::tgi_response(&json()?),
    };

    if response.model.is_empty() {
        response.model = ctx.descriptor.id.to_string();
    }
    response.cost = cost::cost(response.usage.as_ref(), ctx.descriptor);
    Ok(response)
}

/// What one decoded stream frame contributes.
#[derive(Debug, Default, PartialEq)]
pub struct FrameUpdate {
    pub delta: Option<String>,
    /// The frame ends the logical response.
    pub terminal: bool,
}

impl FrameUpdate {
    fn delta(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            delta: (!text.is_empty()).then_some(text),
            terminal: false,
        }
    }

    fn terminal() -> Self {
        Self {
            delta: None,
            terminal: true,
        }
    }
}

/// Map one parsed stream frame. In-band vendor errors surface as
/// `ProviderError`.
pub fn map_frame(
    format: WireFormat,
    provider: ProviderId,
    frame: &Value,
    acc: &mut StreamAccumulator,
) -> Result<FrameUpdate, LlmError> {
    match format {
        WireFormat::OpenAiChat | WireFormat::OpenAiCompletion => {
            openai::map_frame(provider, frame, acc)
        }
        WireFormat::AnthropicMessages => anthropic::map_frame(provider, frame, acc),
        WireFormat::CohereChat | WireFormat::CohereGenerate => {
            cohere::map_frame(provider, frame, acc)
        }
        WireFormat::GeminiGenerate => gemini::map_frame(provider, frame, acc),
        WireFormat::HuggingFaceTgi => huggingface::map_frame(provider, frame, acc),
        _ => Ok(FrameUpdate::default()),
    }
}

/// Tool call assembled from streamed fragments.
#[derive(Debug, Clone, Default, PartialEq)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// State folded from stream frames into the final response.
#[derive(Debug, Clone, Default)]
pub struct StreamAccumulator {
    text: String,
    /// Authoritative full text sent by vendors that repeat it at the end.
    full_text: Option<String>,
    usage: Option<Usage>,
    finish_reason: Option<FinishReason>,
    model: Option<String>,
    metadata: Map<String, Value>,
    tool_calls: Vec<PartialToolCall>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, delta: &str) {
        self.text.push_str(delta);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn merge_usage(&mut self, usage: Usage) {
        match &mut self.usage {
            Some(current) => current.merge(usage),
            None => self.usage = Some(usage),
        }
    }

    fn set_finish(&mut self, raw: &str) {
        self.finish_reason = Some(FinishReason::from_vendor(raw));
    }

    fn set_meta(&mut self, key: &str, value: Value) {
        if !value.is_null() {
            self.metadata.insert(key.to_string(), value);
        }
    }

    fn append_meta_text(&mut self, key: &str, delta: &str) {
        let entry = self
            .metadata
            .entry(key.to_string())
            .or_insert_with(|| Value::String(String::new()));
        if let Value::String(existing) = entry {
            existing.push_str(delta);
        }
    }

    fn tool_call_at(&mut self, index: usize) -> &mut PartialToolCall {
        if self.tool_calls.len() <= index {
            self.tool_calls.resize_with(index + 1, PartialToolCall::default);
        }
        &mut self.tool_calls[index]
    }

    fn push_tool_call(&mut self, id: &str, name: &str) -> usize {
        self.tool_calls.push(PartialToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: String::new(),
        });
        self.tool_calls.len() - 1
    }

    fn last_tool_call(&mut self) -> Option<&mut PartialToolCall> {
        self.tool_calls.last_mut()
    }

    /// Build the `Final` payload.
    pub fn finish(self, descriptor: &ModelDescriptor) -> CompletionResponse {
        let tool_calls: Vec<ToolCall> = self
            .tool_calls
            .into_iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| ToolCall {
                id: c.id,
                name: c.name,
                arguments: parse_arguments(&c.arguments),
            })
            .collect();

        let finish_reason = match self.finish_reason {
            Some(reason) => reason,
            None if !tool_calls.is_empty() => FinishReason::ToolCall,
            None => FinishReason::Unknown,
        };

        let usage = self.usage;
        CompletionResponse {
            text: self.full_text.unwrap_or(self.text),
            model: self.model.unwrap_or_else(|| descriptor.id.to_string()),
            cost: cost::cost(usage.as_ref(), descriptor),
            usage,
            finish_reason,
            tool_calls,
            payload: None,
            provider_metadata: self.metadata,
        }
    }
}

fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Sampling values after clamping to the provider's accepted ranges.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Sampling {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    pub stop: Vec<String>,
    pub seed: Option<u64>,
}

impl Sampling {
    fn resolve(
        provider: ProviderId,
        descriptor: &ModelDescriptor,
        limits: &ParamLimits,
        request: &CompletionRequest,
    ) -> Result<Self, LlmError> {
        let params = &request.sampling;

        if let Some(max) = limits.max_stop_sequences {
            if params.stop.len() > max {
                return Err(LlmError::validation(format!(
                    "{} accepts at most {max} stop sequences, got {}",
                    provider.profile().display_name,
                    params.stop.len()
                )));
            }
        }

        // OpenAI reasoning models reject sampling controls outright.
        let reasoning_only = descriptor.has(Feature::Reasoning)
            && matches!(provider, ProviderId::OpenAi | ProviderId::AzureOpenAi);

        let temperature = if reasoning_only {
            drop_param(provider, "temperature", params.temperature)
        } else {
            clamp_f64(provider, "temperature", params.temperature, limits.temperature)
        };
        let top_p = if reasoning_only {
            drop_param(provider, "top_p", params.top_p)
        } else {
            clamp_f64(provider, "top_p", params.top_p, limits.top_p)
        };
        let top_k = match (params.top_k, limits.top_k) {
            (Some(k), Some((min, max))) => Some(clamp_logged(provider, "top_k", k, min, max)),
            (Some(k), None) => drop_param(provider, "top_k", Some(k)),
            (None, _) => None,
        };
        let max_tokens = match (params.max_tokens, descriptor.max_output) {
            (Some(requested), limit) if limit > 0 && requested > limit => {
                tracing::debug!(
                    provider = %provider,
                    model = %descriptor.id,
                    requested,
                    limit,
                    "clamping max_tokens to model output limit"
                );
                Some(limit)
            }
            (requested, _) => requested,
        };
        let seed = if limits.seed {
            params.seed
        } else {
            drop_param(provider, "seed", params.seed)
        };

        Ok(Self {
            temperature,
            top_p,
            top_k,
            max_tokens,
            stop: params.stop.clone(),
            seed,
        })
    }
}

fn drop_param<T: std::fmt::Debug>(provider: ProviderId, name: &str, value: Option<T>) -> Option<T> {
    if let Some(value) = value {
        tracing::debug!(provider = %provider, param = name, ?value, "parameter not accepted, dropping");
    }
    None
}

fn clamp_f64(
    provider: ProviderId,
    name: &str,
    value: Option<f64>,
    range: Option<(f64, f64)>,
) -> Option<f64> {
    let value = value?;
    let Some((min, max)) = range else {
        return drop_param(provider, name, Some(value));
    };
    if !value.is_finite() {
        return drop_param(provider, name, Some(value));
    }
    Some(clamp_logged(provider, name, value, min, max))
}

fn clamp_logged<T: PartialOrd + Copy + std::fmt::Debug>(
    provider: ProviderId,
    name: &str,
    value: T,
    min: T,
    max: T,
) -> T {
    let clamped = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped != value {
        tracing::debug!(provider = %provider, param = name, ?value, ?clamped, "clamping parameter");
    }
    clamped
}

/// Merge passthrough options into an object payload. Core keys are skipped;
/// when both sides are objects the keys are merged one level deep.
fn merge_provider_options(payload: &mut Value, options: &Map<String, Value>, core: &[&str]) {
    let Some(target) = payload.as_object_mut() else {
        return;
    };
    for (key, value) in options {
        if core.contains(&key.as_str()) {
            tracing::debug!(key = %key, "ignoring provider option that overrides a core field");
            continue;
        }
        if value.is_null() {
            continue;
        }
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (k, v) in incoming {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Inputs shared by every request builder.
pub(crate) struct BuildInput<'a> {
    pub provider: ProviderId,
    pub descriptor: &'a ModelDescriptor,
    pub request: &'a CompletionRequest,
    pub sampling: &'a Sampling,
    pub stream: bool,
    pub stream_usage: bool,
}

impl BuildInput<'_> {
    fn model(&self) -> &str {
        &self.descriptor.id
    }
}

/// Insert `value` under `key` when present.
fn put<T: serde::Serialize>(target: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        if let Ok(value) = serde_json::to_value(value) {
            target.insert(key.to_string(), value);
        }
    }
}

fn u64_at(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer).and_then(Value::as_u64)
}

fn str_at<'v>(value: &'v Value, pointer: &str) -> Option<&'v str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Usage from an object holding input/output (and optionally total) counts.
fn usage_from(value: &Value, input: &str, output: &str, total: Option<&str>) -> Option<Usage> {
    let object = value.as_object()?;
    let read = |key: &str| object.get(key).and_then(Value::as_u64);
    let (input_units, output_units) = (read(input), read(output));
    if input_units.is_none() && output_units.is_none() {
        return None;
    }
    let usage = Usage::new(input_units.unwrap_or(0), output_units.unwrap_or(0));
    Some(match total.and_then(read) {
        Some(total) => usage.with_total(total),
        None => usage,
    })
}

/// Message of an in-band error object, falling back to its JSON text.
fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| error.to_string())
}
