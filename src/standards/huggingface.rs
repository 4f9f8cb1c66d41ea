//! Hugging Face text-generation-inference.

use serde_json::{Map, Value, json};

use super::{BuildInput, FrameUpdate, StreamAccumulator, put, str_at, u64_at};
use crate::error::LlmError;
use crate::providers::ProviderId;
use crate::types::{CompletionResponse, FinishReason, Usage};

pub(super) fn tgi_request(input: &BuildInput<'_>) -> Value {
    let sampling = input.sampling;
    let mut parameters = Map::new();
    put(&mut parameters, "temperature", sampling.temperature);
    put(&mut parameters, "top_p", sampling.top_p);
    put(&mut parameters, "top_k", sampling.top_k);
    put(&mut parameters, "max_new_tokens", sampling.max_tokens);
    put(&mut parameters, "seed", sampling.seed);
    if !sampling.stop.is_empty() {
        parameters.insert("stop".into(), json!(sampling.stop));
    }
    parameters.insert("return_full_text".into(), json!(false));
    parameters.insert("details".into(), json!(true));

    let mut body = Map::new();
    body.insert("inputs".into(), json!(input.request.prompt.to_text()));
    body.insert("parameters".into(), Value::Object(parameters));
    if input.stream {
        body.insert("stream".into(), json!(true));
    }
    Value::Object(body)
}

/// The generated token count is the only usage TGI reports.
fn generated_usage(details: Option<&Value>) -> Option<Usage> {
    u64_at(details?, "/generated_tokens").map(|n| Usage::new(0, n))
}

pub(super) fn tgi_response(value: &Value) -> CompletionResponse {
    // The serverless API wraps the result in a one-element array.
    let result = match value {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };
    let details = result.get("details");
    CompletionResponse {
        text: str_at(&result, "/generated_text").unwrap_or_default().to_string(),
        usage: generated_usage(details),
        finish_reason: details
            .and_then(|d| str_at(d, "/finish_reason"))
            .map(FinishReason::from_vendor)
            .unwrap_or_default(),
        ..Default::default()
    }
}

/// Token frames carry one token each; the last frame repeats the whole
/// generated text, which becomes the final text.
pub(super) fn map_frame(
    provider: ProviderId,
    frame: &Value,
    acc: &mut StreamAccumulator,
) -> Result<FrameUpdate, LlmError> {
    if let Some(error) = str_at(frame, "/error") {
        return Err(LlmError::provider(provider.as_str(), error, Some(frame.clone())));
    }

    let special = frame.pointer("/token/special").and_then(Value::as_bool) == Some(true);
    let mut update = match str_at(frame, "/token/text") {
        Some(text) if !special => FrameUpdate::delta(text),
        _ => FrameUpdate::default(),
    };

    if let Some(full) = str_at(frame, "/generated_text") {
        acc.full_text = Some(full.to_string());
        let details = frame.get("details");
        if let Some(usage) = generated_usage(details) {
            acc.merge_usage(usage);
        }
        if let Some(reason) = details.and_then(|d| str_at(d, "/finish_reason")) {
            acc.set_finish(reason);
        }
        update.terminal = true;
    }
    Ok(update)
}
