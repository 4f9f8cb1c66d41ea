//! Canonical types shared by every provider.

mod model;
mod request;
mod response;

pub use model::{Feature, Modality, ModelDescriptor, Pricing};
pub use request::{
    ChatMessage, CompleteOptions, CompletionRequest, LoadOptions, Prompt, Role, SamplingParams,
    ToolSpec,
};
pub use response::{
    Completion, CompletionEvent, CompletionResponse, CompletionStream, FinishReason,
    GeneratedImage, ModalityPayload, RerankScore, ToolCall, Usage,
};
