//! Amazon Bedrock Converse API and Titan text embeddings.

use serde_json::{Map, Value, json};

use super::openai::float_vec;
use super::{BuildInput, put, str_at, u64_at, usage_from};
use crate::error::LlmError;
use crate::types::{CompletionResponse, FinishReason, ModalityPayload, Role, ToolCall, Usage};

pub(super) fn converse_request(input: &BuildInput<'_>) -> Value {
    let (system, messages) = input.request.prompt.split_system();
    let messages: Vec<Value> = messages
        .into_iter()
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "assistant",
                _ => "user",
            };
            json!({"role": role, "content": [{"text": m.content}]})
        })
        .collect();

    let sampling = input.sampling;
    let mut inference = Map::new();
    put(&mut inference, "maxTokens", sampling.max_tokens);
    put(&mut inference, "temperature", sampling.temperature);
    put(&mut inference, "topP", sampling.top_p);
    if !sampling.stop.is_empty() {
        inference.insert("stopSequences".into(), json!(sampling.stop));
    }

    let mut body = Map::new();
    body.insert("messages".into(), Value::Array(messages));
    if let Some(system) = system {
        body.insert("system".into(), json!([{"text": system}]));
    }
    if !inference.is_empty() {
        body.insert("inferenceConfig".into(), Value::Object(inference));
    }
    // Converse has no portable top_k; model-native fields ride alongside.
    if let Some(top_k) = sampling.top_k {
        body.insert(
            "additionalModelRequestFields".into(),
            json!({"top_k": top_k}),
        );
    }
    if !input.request.tools.is_empty() {
        let tools: Vec<Value> = input
            .request
            .tools
            .iter()
            .map(|t| {
                json!({"toolSpec": {
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": {"json": t.parameters},
                }})
            })
            .collect();
        body.insert("toolConfig".into(), json!({"tools": tools}));
    }
    Value::Object(body)
}

/// Titan embeds one text per invocation.
pub(super) fn titan_embed_request(input: &BuildInput<'_>) -> Result<Value, LlmError> {
    let mut inputs = input.request.embedding_inputs();
    if inputs.len() > 1 {
        return Err(LlmError::validation(format!(
            "{} embeds one text per request, got {}",
            input.model(),
            inputs.len()
        )));
    }
    Ok(json!({"inputText": inputs.pop().unwrap_or_default()}))
}

pub(super) fn converse_response(value: &Value) -> CompletionResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let blocks = value
        .pointer("/output/message/content")
        .and_then(Value::as_array);
    for block in blocks.into_iter().flatten() {
        if let Some(t) = str_at(block, "/text") {
            text.push_str(t);
        } else if let Some(tool) = block.get("toolUse") {
            tool_calls.push(ToolCall {
                id: str_at(tool, "/toolUseId").unwrap_or_default().to_string(),
                name: str_at(tool, "/name").unwrap_or_default().to_string(),
                arguments: tool.get("input").cloned().unwrap_or_else(|| json!({})),
            });
        }
    }

    let mut metadata = Map::new();
    if let Some(latency) = value.pointer("/metrics/latencyMs") {
        metadata.insert("latency_ms".into(), latency.clone());
    }

    CompletionResponse {
        text,
        usage: value
            .get("usage")
            .and_then(|u| usage_from(u, "inputTokens", "outputTokens", Some("totalTokens"))),
        finish_reason: str_at(value, "/stopReason")
            .map(FinishReason::from_vendor)
            .unwrap_or_default(),
        tool_calls,
        provider_metadata: metadata,
        ..Default::default()
    }
}

pub(super) fn titan_embed_response(value: &Value) -> CompletionResponse {
    CompletionResponse {
        usage: u64_at(value, "/inputTextTokenCount").map(|n| Usage::new(n, 0)),
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Embeddings {
            vectors: vec![float_vec(value.get("embedding"))],
        }),
        ..Default::default()
    }
}
