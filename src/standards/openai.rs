//! OpenAI wire formats, shared by every OpenAI-compatible vendor.

use base64::Engine;
use serde_json::{Map, Value, json};

use super::{
    BuildInput, FrameUpdate, ResponseContext, StreamAccumulator, error_message, put, str_at,
    u64_at, usage_from,
};
use crate::error::LlmError;
use crate::providers::ProviderId;
use crate::types::{
    CompletionResponse, Feature, FinishReason, GeneratedImage, ModalityPayload, ToolCall, Usage,
};

pub(super) fn chat_request(input: &BuildInput<'_>) -> Value {
    let messages: Vec<Value> = input
        .request
        .prompt
        .to_messages()
        .into_iter()
        .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
        .collect();

    let mut body = Map::new();
    body.insert("model".into(), json!(input.model()));
    body.insert("messages".into(), Value::Array(messages));
    apply_sampling(&mut body, input);

    if !input.request.tools.is_empty() {
        let tools: Vec<Value> = input
            .request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        body.insert("tools".into(), Value::Array(tools));
    }
    apply_stream(&mut body, input);
    Value::Object(body)
}

pub(super) fn completion_request(input: &BuildInput<'_>) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(input.model()));
    body.insert("prompt".into(), json!(input.request.prompt.to_text()));
    apply_sampling(&mut body, input);
    apply_stream(&mut body, input);
    Value::Object(body)
}

pub(super) fn embedding_request(input: &BuildInput<'_>) -> Value {
    json!({
        "model": input.model(),
        "input": input.request.embedding_inputs(),
    })
}

pub(super) fn image_request(input: &BuildInput<'_>) -> Value {
    json!({
        "model": input.model(),
        "prompt": input.request.prompt.to_text(),
    })
}

pub(super) fn speech_request(input: &BuildInput<'_>) -> Value {
    json!({
        "model": input.model(),
        "input": input.request.prompt.to_text(),
        "voice": "alloy",
    })
}

pub(super) fn video_request(input: &BuildInput<'_>) -> Value {
    json!({
        "model": input.model(),
        "prompt": input.request.prompt.to_text(),
    })
}

fn apply_sampling(body: &mut Map<String, Value>, input: &BuildInput<'_>) {
    let sampling = input.sampling;
    put(body, "temperature", sampling.temperature);
    put(body, "top_p", sampling.top_p);
    put(body, "top_k", sampling.top_k);
    put(body, "seed", sampling.seed);

    // Reasoning models count hidden reasoning against this budget.
    let max_key = if input.descriptor.has(Feature::Reasoning)
        && matches!(input.provider, ProviderId::OpenAi | ProviderId::AzureOpenAi)
    {
        "max_completion_tokens"
    } else {
        "max_tokens"
    };
    put(body, max_key, sampling.max_tokens);

    if !sampling.stop.is_empty() {
        body.insert("stop".into(), json!(sampling.stop));
    }
}

fn apply_stream(body: &mut Map<String, Value>, input: &BuildInput<'_>) {
    if input.stream {
        body.insert("stream".into(), json!(true));
        if input.stream_usage {
            body.insert("stream_options".into(), json!({"include_usage": true}));
        }
    }
}

fn openai_usage(value: &Value) -> Option<Usage> {
    let usage = value.get("usage").filter(|u| u.is_object())?;
    usage_from(usage, "prompt_tokens", "completion_tokens", Some("total_tokens"))
}

/// Vendor extras worth keeping on the final response.
fn collect_metadata(value: &Value, metadata: &mut Map<String, Value>) {
    for key in ["id", "system_fingerprint", "citations", "search_results"] {
        if let Some(v) = value.get(key).filter(|v| !v.is_null()) {
            metadata.insert(key.to_string(), v.clone());
        }
    }
}

fn parse_tool_calls(message: &Value) -> Vec<ToolCall> {
    message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let name = str_at(call, "/function/name")?;
                    let raw = str_at(call, "/function/arguments").unwrap_or("{}");
                    Some(ToolCall {
                        id: call.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                        name: name.to_string(),
                        arguments: serde_json::from_str(raw)
                            .unwrap_or_else(|_| Value::String(raw.to_string())),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(super) fn chat_response(value: &Value) -> CompletionResponse {
    let choice = value.pointer("/choices/0").cloned().unwrap_or(Value::Null);
    let message = choice.get("message").cloned().unwrap_or(Value::Null);

    let mut metadata = Map::new();
    collect_metadata(value, &mut metadata);
    if let Some(reasoning) = message.get("reasoning_content").filter(|v| !v.is_null()) {
        metadata.insert("reasoning_content".into(), reasoning.clone());
    }

    CompletionResponse {
        text: str_at(&message, "/content").unwrap_or_default().to_string(),
        model: str_at(value, "/model").unwrap_or_default().to_string(),
        usage: openai_usage(value),
        finish_reason: str_at(&choice, "/finish_reason")
            .map(FinishReason::from_vendor)
            .unwrap_or_default(),
        tool_calls: parse_tool_calls(&message),
        provider_metadata: metadata,
        ..Default::default()
    }
}

pub(super) fn completion_response(value: &Value) -> CompletionResponse {
    let mut metadata = Map::new();
    collect_metadata(value, &mut metadata);
    CompletionResponse {
        text: str_at(value, "/choices/0/text").unwrap_or_default().to_string(),
        model: str_at(value, "/model").unwrap_or_default().to_string(),
        usage: openai_usage(value),
        finish_reason: str_at(value, "/choices/0/finish_reason")
            .map(FinishReason::from_vendor)
            .unwrap_or_default(),
        provider_metadata: metadata,
        ..Default::default()
    }
}

pub(super) fn embedding_response(value: &Value) -> CompletionResponse {
    let vectors = value
        .get("data")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(|item| float_vec(item.get("embedding"))).collect())
        .unwrap_or_default();
    CompletionResponse {
        model: str_at(value, "/model").unwrap_or_default().to_string(),
        usage: value.get("usage").and_then(|u| {
            u64_at(u, "/prompt_tokens").map(|input| Usage::new(input, 0))
        }),
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Embeddings { vectors }),
        ..Default::default()
    }
}

pub(super) fn image_response(value: &Value) -> CompletionResponse {
    let images = value
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| GeneratedImage {
                    url: str_at(item, "/url").map(str::to_string),
                    b64_data: str_at(item, "/b64_json").map(str::to_string),
                    revised_prompt: str_at(item, "/revised_prompt").map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();
    CompletionResponse {
        usage: value
            .get("usage")
            .and_then(|u| usage_from(u, "input_tokens", "output_tokens", Some("total_tokens"))),
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Images { images }),
        ..Default::default()
    }
}

pub(super) fn video_response(value: &Value) -> CompletionResponse {
    let status = str_at(value, "/status").unwrap_or("queued").to_string();
    let finish_reason = match status.as_str() {
        "completed" => FinishReason::Stop,
        _ => FinishReason::Unknown,
    };
    CompletionResponse {
        model: str_at(value, "/model").unwrap_or_default().to_string(),
        finish_reason,
        payload: Some(ModalityPayload::Video {
            id: str_at(value, "/id").unwrap_or_default().to_string(),
            status,
            url: str_at(value, "/url").map(str::to_string),
        }),
        ..Default::default()
    }
}

/// Speech endpoints return raw audio. Billed units are input characters.
pub(super) fn speech_response(body: &[u8], ctx: &ResponseContext<'_>) -> CompletionResponse {
    let format = ctx
        .request
        .provider_options
        .get("response_format")
        .and_then(Value::as_str)
        .unwrap_or("mp3")
        .to_string();
    CompletionResponse {
        usage: Some(Usage::new(ctx.request.prompt.char_count(), 0)),
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Audio {
            data: base64::engine::general_purpose::STANDARD.encode(body),
            format,
        }),
        ..Default::default()
    }
}

pub(super) fn float_vec(value: Option<&Value>) -> Vec<f32> {
    value
        .and_then(Value::as_array)
        .map(|xs| xs.iter().filter_map(Value::as_f64).map(|x| x as f32).collect())
        .unwrap_or_default()
}

/// Chat and completion chunks. The usage trailer sent when
/// `stream_options.include_usage` is set carries no choices and ends the
/// response. Vendors that repeat cumulative usage on every chunk (Perplexity)
/// only end it on the chunk that also carries a finish reason.
pub(super) fn map_frame(
    provider: ProviderId,
    frame: &Value,
    acc: &mut StreamAccumulator,
) -> Result<FrameUpdate, LlmError> {
    if let Some(error) = frame.get("error").filter(|e| !e.is_null()) {
        return Err(LlmError::provider(
            provider.as_str(),
            error_message(error),
            Some(frame.clone()),
        ));
    }

    if acc.model.is_none() {
        acc.model = str_at(frame, "/model").map(str::to_string);
    }
    collect_metadata(frame, &mut acc.metadata);

    let mut update = FrameUpdate::default();
    let mut finished = false;
    if let Some(choice) = frame.pointer("/choices/0") {
        let text = str_at(choice, "/delta/content").or_else(|| str_at(choice, "/text"));
        if let Some(text) = text {
            update = FrameUpdate::delta(text);
        }
        if let Some(reasoning) = str_at(choice, "/delta/reasoning_content") {
            acc.append_meta_text("reasoning_content", reasoning);
        }
        if let Some(calls) = choice.pointer("/delta/tool_calls").and_then(Value::as_array) {
            for (position, call) in calls.iter().enumerate() {
                let index = call
                    .get("index")
                    .and_then(Value::as_u64)
                    .map_or(position, |i| i as usize);
                let slot = acc.tool_call_at(index);
                if let Some(id) = str_at(call, "/id") {
                    slot.id = id.to_string();
                }
                if let Some(name) = str_at(call, "/function/name") {
                    slot.name.push_str(name);
                }
                if let Some(args) = str_at(call, "/function/arguments") {
                    slot.arguments.push_str(args);
                }
            }
        }
        if let Some(reason) = str_at(choice, "/finish_reason") {
            acc.set_finish(reason);
            finished = true;
        }
    }

    // Groq reports streaming usage under `x_groq`.
    let usage = openai_usage(frame).or_else(|| frame.get("x_groq").and_then(openai_usage));
    if let Some(usage) = usage {
        acc.merge_usage(usage);
        let trailer = frame
            .get("choices")
            .and_then(Value::as_array)
            .is_none_or(Vec::is_empty);
        update.terminal = trailer || finished;
    }
    Ok(update)
}
