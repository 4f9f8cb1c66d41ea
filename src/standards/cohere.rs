//! Cohere v2 chat, v1 generate, embed and rerank.
//!
//! Together's rerank endpoint accepts the same request and answers with the
//! same `results` array, so rerank parsing also reads OpenAI-style usage.

use serde_json::{Map, Value, json};

use super::openai::float_vec;
use super::{
    BuildInput, FrameUpdate, StreamAccumulator, error_message, put, str_at, u64_at, usage_from,
};
use crate::error::LlmError;
use crate::providers::ProviderId;
use crate::types::{
    CompletionResponse, FinishReason, ModalityPayload, RerankScore, Role, ToolCall, Usage,
};

fn apply_sampling(body: &mut Map<String, Value>, input: &BuildInput<'_>, stop_key: &str) {
    let sampling = input.sampling;
    put(body, "temperature", sampling.temperature);
    put(body, "p", sampling.top_p);
    put(body, "k", sampling.top_k);
    put(body, "max_tokens", sampling.max_tokens);
    put(body, "seed", sampling.seed);
    if !sampling.stop.is_empty() {
        body.insert(stop_key.into(), json!(sampling.stop));
    }
}

pub(super) fn chat_request(input: &BuildInput<'_>) -> Value {
    let messages: Vec<Value> = input
        .request
        .prompt
        .to_messages()
        .into_iter()
        .map(|m| {
            let role = match m.role {
                Role::Tool => "user",
                other => other.as_str(),
            };
            json!({"role": role, "content": m.content})
        })
        .collect();

    let mut body = Map::new();
    body.insert("model".into(), json!(input.model()));
    body.insert("messages".into(), Value::Array(messages));
    apply_sampling(&mut body, input, "stop_sequences");

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
    if !input.request.documents.is_empty() {
        body.insert("documents".into(), json!(input.request.documents));
    }
    if input.stream {
        body.insert("stream".into(), json!(true));
    }
    Value::Object(body)
}

pub(super) fn generate_request(input: &BuildInput<'_>) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(input.model()));
    body.insert("prompt".into(), json!(input.request.prompt.to_text()));
    apply_sampling(&mut body, input, "end_sequences");
    if input.stream {
        body.insert("stream".into(), json!(true));
    }
    Value::Object(body)
}

pub(super) fn embed_request(input: &BuildInput<'_>) -> Value {
    json!({
        "model": input.model(),
        "texts": input.request.embedding_inputs(),
        "input_type": "search_document",
        "embedding_types": ["float"],
    })
}

/// The prompt is the query; documents are required.
pub(super) fn rerank_request(input: &BuildInput<'_>) -> Result<Value, LlmError> {
    if input.request.documents.is_empty() {
        return Err(LlmError::validation(format!(
            "rerank model '{}' needs at least one document",
            input.model()
        )));
    }
    Ok(json!({
        "model": input.model(),
        "query": input.request.prompt.to_text(),
        "documents": input.request.documents,
    }))
}

fn billed_usage(meta: Option<&Value>) -> Option<Usage> {
    usage_from(meta?.get("billed_units")?, "input_tokens", "output_tokens", None)
}

pub(super) fn chat_response(value: &Value) -> CompletionResponse {
    let text: String = value
        .pointer("/message/content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|block| str_at(block, "/type") == Some("text"))
        .filter_map(|block| str_at(block, "/text"))
        .collect();

    let tool_calls = value
        .pointer("/message/tool_calls")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|call| {
            let raw = str_at(call, "/function/arguments").unwrap_or("{}");
            ToolCall {
                id: str_at(call, "/id").unwrap_or_default().to_string(),
                name: str_at(call, "/function/name").unwrap_or_default().to_string(),
                arguments: serde_json::from_str(raw).unwrap_or_else(|_| json!(raw)),
            }
        })
        .collect();

    let mut metadata = Map::new();
    if let Some(id) = value.get("id").filter(|v| !v.is_null()) {
        metadata.insert("generation_id".into(), id.clone());
    }
    if let Some(citations) = value.pointer("/message/citations").filter(|v| !v.is_null()) {
        metadata.insert("citations".into(), citations.clone());
    }

    CompletionResponse {
        text,
        usage: billed_usage(value.get("usage")),
        finish_reason: str_at(value, "/finish_reason")
            .map(FinishReason::from_vendor)
            .unwrap_or_default(),
        tool_calls,
        provider_metadata: metadata,
        ..Default::default()
    }
}

pub(super) fn generate_response(value: &Value) -> CompletionResponse {
    let mut metadata = Map::new();
    if let Some(id) = value.get("id").filter(|v| !v.is_null()) {
        metadata.insert("generation_id".into(), id.clone());
    }
    CompletionResponse {
        text: str_at(value, "/generations/0/text").unwrap_or_default().to_string(),
        usage: billed_usage(value.get("meta")),
        finish_reason: str_at(value, "/generations/0/finish_reason")
            .map(FinishReason::from_vendor)
            .unwrap_or_default(),
        provider_metadata: metadata,
        ..Default::default()
    }
}

pub(super) fn embed_response(value: &Value) -> CompletionResponse {
    // `embedding_types` nests vectors by type; older responses are a bare array.
    let embeddings = value
        .pointer("/embeddings/float")
        .or_else(|| value.get("embeddings"));
    let vectors = embeddings
        .and_then(Value::as_array)
        .map(|items| items.iter().map(|v| float_vec(Some(v))).collect())
        .unwrap_or_default();
    CompletionResponse {
        usage: billed_usage(value.get("meta")),
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Embeddings { vectors }),
        ..Default::default()
    }
}

pub(super) fn rerank_response(value: &Value) -> CompletionResponse {
    let scores = value
        .get("results")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|result| {
            Some(RerankScore {
                index: u64_at(result, "/index")? as usize,
                relevance_score: result.get("relevance_score")?.as_f64()?,
            })
        })
        .collect();

    let usage = u64_at(value, "/meta/billed_units/search_units")
        .map(|units| Usage::new(units, 0))
        .or_else(|| {
            value
                .get("usage")
                .and_then(|u| usage_from(u, "prompt_tokens", "completion_tokens", Some("total_tokens")))
        });

    CompletionResponse {
        model: str_at(value, "/model").unwrap_or_default().to_string(),
        usage,
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Rerank { scores }),
        ..Default::default()
    }
}

/// Both Cohere stream shapes. v2 frames carry a `type`; v1 frames carry
/// `text` deltas and finish with `is_finished: true`.
pub(super) fn map_frame(
    provider: ProviderId,
    frame: &Value,
    acc: &mut StreamAccumulator,
) -> Result<FrameUpdate, LlmError> {
    match str_at(frame, "/type") {
        Some(kind) => map_v2_frame(provider, kind, frame, acc),
        None => map_v1_frame(provider, frame, acc),
    }
}

fn map_v2_frame(
    provider: ProviderId,
    kind: &str,
    frame: &Value,
    acc: &mut StreamAccumulator,
) -> Result<FrameUpdate, LlmError> {
    match kind {
        "message-start" => {
            acc.set_meta("generation_id", frame.get("id").cloned().unwrap_or(Value::Null));
            Ok(FrameUpdate::default())
        }
        "content-delta" => Ok(FrameUpdate::delta(
            str_at(frame, "/delta/message/content/text").unwrap_or_default(),
        )),
        "tool-call-start" => {
            let call = frame
                .pointer("/delta/message/tool_calls")
                .cloned()
                .unwrap_or(Value::Null);
            let slot = acc.push_tool_call(
                str_at(&call, "/id").unwrap_or_default(),
                str_at(&call, "/function/name").unwrap_or_default(),
            );
            if let Some(args) = str_at(&call, "/function/arguments") {
                acc.tool_call_at(slot).arguments.push_str(args);
            }
            Ok(FrameUpdate::default())
        }
        "tool-call-delta" => {
            if let (Some(call), Some(args)) = (
                acc.last_tool_call(),
                str_at(frame, "/delta/message/tool_calls/function/arguments"),
            ) {
                call.arguments.push_str(args);
            }
            Ok(FrameUpdate::default())
        }
        "message-end" => {
            if let Some(reason) = str_at(frame, "/delta/finish_reason") {
                acc.set_finish(reason);
            }
            if let Some(usage) = billed_usage(frame.pointer("/delta/usage")) {
                acc.merge_usage(usage);
            }
            if let Some(error) = str_at(frame, "/delta/error") {
                return Err(LlmError::provider(provider.as_str(), error, Some(frame.clone())));
            }
            Ok(FrameUpdate::terminal())
        }
        _ => Ok(FrameUpdate::default()),
    }
}

fn map_v1_frame(
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

    let finished = frame.get("is_finished").and_then(Value::as_bool) == Some(true)
        || str_at(frame, "/event_type") == Some("stream-end");
    if !finished {
        return Ok(FrameUpdate::delta(str_at(frame, "/text").unwrap_or_default()));
    }

    if let Some(reason) = str_at(frame, "/finish_reason") {
        acc.set_finish(reason);
    }
    if let Some(response) = frame.get("response") {
        if let Some(usage) = billed_usage(response.get("meta")) {
            acc.merge_usage(usage);
        }
        acc.set_meta("generation_id", response.get("id").cloned().unwrap_or(Value::Null));
    }
    Ok(FrameUpdate::terminal())
}
