//! Gemini `generateContent`, shared by the Generative Language API and
//! Vertex AI, plus both embedding shapes.

use serde_json::{Map, Value, json};

use super::openai::float_vec;
use super::{BuildInput, FrameUpdate, StreamAccumulator, error_message, put, str_at, usage_from};
use crate::error::LlmError;
use crate::providers::ProviderId;
use crate::types::{CompletionResponse, FinishReason, ModalityPayload, Role, ToolCall, Usage};

pub(super) fn generate_request(input: &BuildInput<'_>) -> Value {
    let (system, messages) = input.request.prompt.split_system();
    let contents: Vec<Value> = messages
        .into_iter()
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "model",
                _ => "user",
            };
            json!({"role": role, "parts": [{"text": m.content}]})
        })
        .collect();

    let sampling = input.sampling;
    let mut config = Map::new();
    put(&mut config, "temperature", sampling.temperature);
    put(&mut config, "topP", sampling.top_p);
    put(&mut config, "topK", sampling.top_k);
    put(&mut config, "maxOutputTokens", sampling.max_tokens);
    put(&mut config, "seed", sampling.seed);
    if !sampling.stop.is_empty() {
        config.insert("stopSequences".into(), json!(sampling.stop));
    }

    let mut body = Map::new();
    body.insert("contents".into(), Value::Array(contents));
    if let Some(system) = system {
        body.insert(
            "systemInstruction".into(),
            json!({"parts": [{"text": system}]}),
        );
    }
    if !config.is_empty() {
        body.insert("generationConfig".into(), Value::Object(config));
    }
    if !input.request.tools.is_empty() {
        let declarations: Vec<Value> = input
            .request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();
        body.insert(
            "tools".into(),
            json!([{"functionDeclarations": declarations}]),
        );
    }
    Value::Object(body)
}

pub(super) fn embed_request(input: &BuildInput<'_>) -> Value {
    let model = format!("models/{}", input.model());
    let requests: Vec<Value> = input
        .request
        .embedding_inputs()
        .into_iter()
        .map(|text| json!({"model": model, "content": {"parts": [{"text": text}]}}))
        .collect();
    json!({"requests": requests})
}

pub(super) fn vertex_embed_request(input: &BuildInput<'_>) -> Value {
    let instances: Vec<Value> = input
        .request
        .embedding_inputs()
        .into_iter()
        .map(|text| json!({"content": text}))
        .collect();
    json!({"instances": instances})
}

fn gemini_usage(value: &Value) -> Option<Usage> {
    usage_from(
        value.get("usageMetadata")?,
        "promptTokenCount",
        "candidatesTokenCount",
        Some("totalTokenCount"),
    )
}

/// Text and function calls of the first candidate. Thought parts go to
/// `thinking` instead of the answer.
fn read_parts(candidate: &Value, mut on_text: impl FnMut(&str, bool), mut on_call: impl FnMut(ToolCall)) {
    let parts = candidate.pointer("/content/parts").and_then(Value::as_array);
    for part in parts.into_iter().flatten() {
        if let Some(text) = str_at(part, "/text") {
            let thought = part.get("thought").and_then(Value::as_bool) == Some(true);
            on_text(text, thought);
        } else if let Some(call) = part.get("functionCall") {
            on_call(ToolCall {
                id: str_at(call, "/id").unwrap_or_default().to_string(),
                name: str_at(call, "/name").unwrap_or_default().to_string(),
                arguments: call.get("args").cloned().unwrap_or_else(|| json!({})),
            });
        }
    }
}

pub(super) fn generate_response(value: &Value) -> CompletionResponse {
    let candidate = value.pointer("/candidates/0").cloned().unwrap_or(Value::Null);
    let mut text = String::new();
    let mut thinking = String::new();
    let mut tool_calls = Vec::new();
    read_parts(
        &candidate,
        |t, thought| if thought { thinking.push_str(t) } else { text.push_str(t) },
        |call| tool_calls.push(call),
    );

    let mut metadata = Map::new();
    if !thinking.is_empty() {
        metadata.insert("thinking".into(), json!(thinking));
    }
    if let Some(grounding) = candidate.get("groundingMetadata") {
        metadata.insert("grounding_metadata".into(), grounding.clone());
    }

    let finish_reason = match str_at(&candidate, "/finishReason") {
        Some(_) if !tool_calls.is_empty() => FinishReason::ToolCall,
        Some(reason) => FinishReason::from_vendor(reason),
        None => FinishReason::Unknown,
    };

    CompletionResponse {
        text,
        model: str_at(value, "/modelVersion").unwrap_or_default().to_string(),
        usage: gemini_usage(value),
        finish_reason,
        tool_calls,
        provider_metadata: metadata,
        ..Default::default()
    }
}

/// `batchEmbedContents` reports no token counts.
pub(super) fn embed_response(value: &Value) -> CompletionResponse {
    let vectors = value
        .get("embeddings")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(|item| float_vec(item.get("values"))).collect())
        .unwrap_or_default();
    CompletionResponse {
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Embeddings { vectors }),
        ..Default::default()
    }
}

pub(super) fn vertex_embed_response(value: &Value) -> CompletionResponse {
    let predictions = value.get("predictions").and_then(Value::as_array);
    let mut vectors = Vec::new();
    let mut tokens = 0;
    for prediction in predictions.into_iter().flatten() {
        vectors.push(float_vec(prediction.pointer("/embeddings/values")));
        tokens += prediction
            .pointer("/embeddings/statistics/token_count")
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as u64;
    }
    CompletionResponse {
        usage: (tokens > 0).then(|| Usage::new(tokens, 0)),
        finish_reason: FinishReason::Stop,
        payload: Some(ModalityPayload::Embeddings { vectors }),
        ..Default::default()
    }
}

/// Each SSE frame is a partial `GenerateContentResponse`; the one carrying
/// `finishReason` is the last.
pub(super) fn map_frame(
    provider: ProviderId,
    frame: &Value,
    acc: &mut StreamAccumulator,
) -> Result<FrameUpdate, LlmError> {
    if let Some(error) = frame.get("error") {
        return Err(LlmError::provider(
            provider.as_str(),
            error_message(error),
            Some(frame.clone()),
        ));
    }

    if let Some(usage) = gemini_usage(frame) {
        acc.merge_usage(usage);
    }
    if acc.model.is_none() {
        acc.model = str_at(frame, "/modelVersion").map(str::to_string);
    }

    let candidate = frame.pointer("/candidates/0").cloned().unwrap_or(Value::Null);
    let mut delta = String::new();
    let mut thinking = String::new();
    let mut calls = Vec::new();
    read_parts(
        &candidate,
        |t, thought| if thought { thinking.push_str(t) } else { delta.push_str(t) },
        |call| calls.push(call),
    );
    if !thinking.is_empty() {
        acc.append_meta_text("thinking", &thinking);
    }
    for call in calls {
        let slot = acc.push_tool_call(&call.id, &call.name);
        acc.tool_call_at(slot).arguments = call.arguments.to_string();
    }
    if let Some(grounding) = candidate.get("groundingMetadata") {
        acc.set_meta("grounding_metadata", grounding.clone());
    }

    let mut update = FrameUpdate::delta(delta);
    if let Some(reason) = str_at(&candidate, "/finishReason") {
        acc.set_finish(reason);
        update.terminal = true;
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelDescriptor;

    #[test]
    fn response_reads_parts_and_usage_metadata() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "weighing options", "thought": true},
                    {"text": "Hello "},
                    {"text": "there"}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 8, "candidatesTokenCount": 3, "totalTokenCount": 15},
            "modelVersion": "gemini-2.5-flash"
        });
        let response = generate_response(&body);
        assert_eq!(response.text, "Hello there");
        assert_eq!(response.usage, Some(Usage::new(8, 3).with_total(15)));
        assert_eq!(response.provider_metadata["thinking"], json!("weighing options"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn function_call_sets_tool_finish() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"functionCall": {"name": "weather", "args": {"city": "Oslo"}}}]},
                "finishReason": "STOP"
            }]
        });
        let response = generate_response(&body);
        assert_eq!(response.finish_reason, FinishReason::ToolCall);
        assert_eq!(response.tool_calls[0].name, "weather");
    }

    #[test]
    fn finish_reason_frame_is_terminal() {
        let mut acc = StreamAccumulator::new();
        let first = json!({"candidates": [{"content": {"parts": [{"text": "Hi"}]}}]});
        let last = json!({
            "candidates": [{"content": {"parts": [{"text": "!"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 2, "candidatesTokenCount": 2}
        });
        let a = map_frame(ProviderId::Gemini, &first, &mut acc).unwrap();
        let b = map_frame(ProviderId::Gemini, &last, &mut acc).unwrap();
        assert_eq!(a.delta.as_deref(), Some("Hi"));
        assert!(!a.terminal);
        assert_eq!(b.delta.as_deref(), Some("!"));
        assert!(b.terminal);
        let response = acc.finish(&ModelDescriptor::unknown("gemini-2.0-flash"));
        assert_eq!(response.usage, Some(Usage::new(2, 2)));
    }

    #[test]
    fn vertex_embeddings_sum_token_statistics() {
        let body = json!({"predictions": [
            {"embeddings": {"values": [0.1, 0.2], "statistics": {"token_count": 3.0}}},
            {"embeddings": {"values": [0.3, 0.4], "statistics": {"token_count": 2.0}}}
        ]});
        let response = vertex_embed_response(&body);
        assert_eq!(response.usage, Some(Usage::new(5, 0)));
    }
}
