//! Anthropic Messages API.

use serde_json::{Map, Value, json};

use super::{
    BuildInput, FrameUpdate, StreamAccumulator, error_message, put, str_at, u64_at, usage_from,
};
use crate::defaults::FALLBACK_MAX_OUTPUT;
use crate::error::LlmError;
use crate::providers::ProviderId;
use crate::types::{CompletionResponse, FinishReason, Role, ToolCall, Usage};

pub(super) fn messages_request(input: &BuildInput<'_>) -> Value {
    let (system, messages) = input.request.prompt.split_system();
    let messages: Vec<Value> = messages
        .into_iter()
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "assistant",
                _ => "user",
            };
            json!({"role": role, "content": m.content})
        })
        .collect();

    // max_tokens is mandatory on this API.
    let max_tokens = input.sampling.max_tokens.unwrap_or(match input.descriptor.max_output {
        0 => FALLBACK_MAX_OUTPUT,
        limit => limit.min(FALLBACK_MAX_OUTPUT),
    });

    let mut body = Map::new();
    body.insert("model".into(), json!(input.model()));
    body.insert("messages".into(), Value::Array(messages));
    body.insert("max_tokens".into(), json!(max_tokens));
    put(&mut body, "system", system);
    put(&mut body, "temperature", input.sampling.temperature);
    put(&mut body, "top_p", input.sampling.top_p);
    put(&mut body, "top_k", input.sampling.top_k);
    if !input.sampling.stop.is_empty() {
        body.insert("stop_sequences".into(), json!(input.sampling.stop));
    }
    if !input.request.tools.is_empty() {
        let tools: Vec<Value> = input
            .request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters,
                })
            })
            .collect();
        body.insert("tools".into(), Value::Array(tools));
    }
    if input.stream {
        body.insert("stream".into(), json!(true));
    }
    Value::Object(body)
}

fn anthropic_usage(value: Option<&Value>) -> Option<Usage> {
    usage_from(value?, "input_tokens", "output_tokens", None)
}

pub(super) fn messages_response(value: &Value) -> CompletionResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut metadata = Map::new();

    for block in value.get("content").and_then(Value::as_array).into_iter().flatten() {
        match str_at(block, "/type") {
            Some("text") => text.push_str(str_at(block, "/text").unwrap_or_default()),
            Some("tool_use") => tool_calls.push(ToolCall {
                id: str_at(block, "/id").unwrap_or_default().to_string(),
                name: str_at(block, "/name").unwrap_or_default().to_string(),
                arguments: block.get("input").cloned().unwrap_or_else(|| json!({})),
            }),
            Some("thinking") => {
                if let Some(thinking) = str_at(block, "/thinking") {
                    metadata.insert("thinking".into(), json!(thinking));
                }
            }
            _ => {}
        }
    }
    if let Some(id) = value.get("id").filter(|v| !v.is_null()) {
        metadata.insert("id".into(), id.clone());
    }

    CompletionResponse {
        text,
        model: str_at(value, "/model").unwrap_or_default().to_string(),
        usage: anthropic_usage(value.get("usage")),
        finish_reason: str_at(value, "/stop_reason")
            .map(FinishReason::from_vendor)
            .unwrap_or_default(),
        tool_calls,
        provider_metadata: metadata,
        ..Default::default()
    }
}

/// Typed SSE events. `message_stop` ends the response; `ping` carries
/// nothing.
pub(super) fn map_frame(
    provider: ProviderId,
    frame: &Value,
    acc: &mut StreamAccumulator,
) -> Result<FrameUpdate, LlmError> {
    match str_at(frame, "/type").unwrap_or_default() {
        "message_start" => {
            let message = frame.get("message").cloned().unwrap_or(Value::Null);
            if let Some(usage) = anthropic_usage(message.get("usage")) {
                acc.merge_usage(usage);
            }
            acc.model = str_at(&message, "/model").map(str::to_string);
            acc.set_meta("id", message.get("id").cloned().unwrap_or(Value::Null));
            Ok(FrameUpdate::default())
        }
        "content_block_start" => {
            if str_at(frame, "/content_block/type") == Some("tool_use") {
                acc.push_tool_call(
                    str_at(frame, "/content_block/id").unwrap_or_default(),
                    str_at(frame, "/content_block/name").unwrap_or_default(),
                );
            }
            Ok(FrameUpdate::default())
        }
        "content_block_delta" => match str_at(frame, "/delta/type") {
            Some("text_delta") => Ok(FrameUpdate::delta(
                str_at(frame, "/delta/text").unwrap_or_default(),
            )),
            Some("input_json_delta") => {
                if let (Some(call), Some(partial)) =
                    (acc.last_tool_call(), str_at(frame, "/delta/partial_json"))
                {
                    call.arguments.push_str(partial);
                }
                Ok(FrameUpdate::default())
            }
            Some("thinking_delta") => {
                acc.append_meta_text("thinking", str_at(frame, "/delta/thinking").unwrap_or_default());
                Ok(FrameUpdate::default())
            }
            _ => Ok(FrameUpdate::default()),
        },
        "message_delta" => {
            if let Some(reason) = str_at(frame, "/delta/stop_reason") {
                acc.set_finish(reason);
            }
            if let Some(output) = u64_at(frame, "/usage/output_tokens") {
                acc.merge_usage(Usage::new(0, output));
            }
            Ok(FrameUpdate::default())
        }
        "message_stop" => Ok(FrameUpdate::terminal()),
        "error" => Err(LlmError::provider(
            provider.as_str(),
            frame.get("error").map(error_message).unwrap_or_else(|| frame.to_string()),
            Some(frame.clone()),
        )),
        _ => Ok(FrameUpdate::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelDescriptor;

    #[test]
    fn response_joins_text_blocks_and_reads_tool_use() {
        let body = json!({
            "id": "msg_1",
            "model": "claude-3-5-haiku-20241022",
            "content": [
                {"type": "text", "text": "Checking. "},
                {"type": "tool_use", "id": "toolu_1", "name": "weather", "input": {"city": "Oslo"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 7}
        });
        let response = messages_response(&body);
        assert_eq!(response.text, "Checking. ");
        assert_eq!(response.finish_reason, FinishReason::ToolCall);
        assert_eq!(response.usage, Some(Usage::new(12, 7)));
        assert_eq!(response.tool_calls[0].arguments, json!({"city": "Oslo"}));
    }

    #[test]
    fn stream_events_fold_into_final_usage() {
        let mut acc = StreamAccumulator::new();
        let frames = [
            json!({"type": "message_start", "message": {"id": "msg_1", "model": "claude-3-haiku-20240307", "usage": {"input_tokens": 10, "output_tokens": 1}}}),
            json!({"type": "ping"}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hi"}}),
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": 4}}),
        ];
        let mut deltas = Vec::new();
        for frame in &frames {
            let update = map_frame(ProviderId::Anthropic, frame, &mut acc).unwrap();
            assert!(!update.terminal);
            deltas.extend(update.delta);
        }
        assert_eq!(deltas, vec!["Hi".to_string()]);
        let stop = map_frame(ProviderId::Anthropic, &json!({"type": "message_stop"}), &mut acc).unwrap();
        assert!(stop.terminal);

        acc.push_text("Hi");
        let response = acc.finish(&ModelDescriptor::unknown("claude-3-haiku-20240307"));
        assert_eq!(response.usage, Some(Usage::new(10, 4)));
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn overloaded_event_is_a_provider_error() {
        let mut acc = StreamAccumulator::new();
        let err = map_frame(
            ProviderId::Anthropic,
            &json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
            &mut acc,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Provider);
    }
}
