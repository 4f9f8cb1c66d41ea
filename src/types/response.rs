//! Canonical response and streaming event types.

use futures::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;

use crate::error::LlmError;

/// Billed units reported by the vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_units: u64,
    pub output_units: u64,
    pub total_units: u64,
}

impl Usage {
    /// Total defaults to input + output.
    pub const fn new(input_units: u64, output_units: u64) -> Self {
        Self {
            input_units,
            output_units,
            total_units: input_units + output_units,
        }
    }

    pub const fn with_total(mut self, total_units: u64) -> Self {
        self.total_units = total_units;
        self
    }

    /// Fold a later usage report into this one. Streaming vendors split input
    /// and output counts across frames, so non-zero counters win.
    pub fn merge(&mut self, other: Usage) {
        if other.input_units > 0 {
            self.input_units = other.input_units;
        }
        if other.output_units > 0 {
            self.output_units = other.output_units;
        }
        self.total_units = other
            .total_units
            .max(self.input_units + self.output_units);
    }
}

/// Why generation stopped, normalized across vendors.
///
/// | Variant | OpenAI-style | Anthropic | Cohere | Gemini | Bedrock | TGI |
/// |---|---|---|---|---|---|---|
/// | `Stop` | `stop` | `end_turn`, `stop_sequence` | `COMPLETE`, `STOP_SEQUENCE` | `STOP` | `end_turn` | `eos_token`, `stop_sequence` |
/// | `Length` | `length` | `max_tokens` | `MAX_TOKENS` | `MAX_TOKENS` | `max_tokens` | `length` |
/// | `ToolCall` | `tool_calls` | `tool_use` | `TOOL_CALL` | | `tool_use` | |
/// | `ContentFilter` | `content_filter` | `refusal` | `ERROR_TOXIC` | `SAFETY`, `RECITATION`, ... | `guardrail_intervened` | |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCall,
    ContentFilter,
    #[default]
    Unknown,
}

impl FinishReason {
    pub fn from_vendor(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "stop" | "end_turn" | "stop_sequence" | "complete" | "eos_token" | "eos" => Self::Stop,
            "length" | "max_tokens" | "model_length" => Self::Length,
            "tool_calls" | "function_call" | "tool_use" | "tool_call" => Self::ToolCall,
            "content_filter" | "refusal" | "error_toxic" | "safety" | "recitation"
            | "blocklist" | "prohibited_content" | "spii" | "image_safety"
            | "guardrail_intervened" | "content_filtered" => Self::ContentFilter,
            _ => Self::Unknown,
        }
    }
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankScore {
    pub index: usize,
    pub relevance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: Option<String>,
    /// Base64 image data when the vendor returns inline bytes.
    pub b64_data: Option<String>,
    pub revised_prompt: Option<String>,
}

/// Non-text output of embedding, rerank, image, video and speech models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModalityPayload {
    Embeddings {
        vectors: Vec<Vec<f32>>,
    },
    Rerank {
        scores: Vec<RerankScore>,
    },
    Images {
        images: Vec<GeneratedImage>,
    },
    Video {
        id: String,
        status: String,
        url: Option<String>,
    },
    Audio {
        /// Base64-encoded audio bytes.
        data: String,
        format: String,
    },
}

/// The terminal, canonical result of a completion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub model: String,
    pub usage: Option<Usage>,
    pub cost: f64,
    pub finish_reason: FinishReason,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ModalityPayload>,
    #[serde(default)]
    pub provider_metadata: Map<String, Value>,
}

/// One event of a streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionEvent {
    Chunk { text: String, sequence_index: u64 },
    Final(CompletionResponse),
}

impl CompletionEvent {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}

/// Lazy, finite, non-restartable event sequence. Dropping it releases the
/// underlying connection.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionEvent, LlmError>> + Send>>;

/// Result of [`Adapter::complete`](crate::Adapter::complete).
pub enum Completion {
    Response(CompletionResponse),
    Stream(CompletionStream),
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl Completion {
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Drain to the final response. Streams that end without a `Final`
    /// event are a stream error.
    pub async fn into_response(self) -> Result<CompletionResponse, LlmError> {
        match self {
            Self::Response(response) => Ok(response),
            Self::Stream(mut stream) => {
                while let Some(event) = stream.next().await {
                    if let CompletionEvent::Final(response) = event? {
                        return Ok(response);
                    }
                }
                Err(LlmError::StreamError(
                    "stream ended without a final event".to_string(),
                ))
            }
        }
    }
}
