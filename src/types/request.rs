//! Canonical request types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Prompt text or an ordered conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl Prompt {
    /// The conversation form; plain text becomes a single user turn.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        match self {
            Self::Text(text) => vec![ChatMessage::user(text.clone())],
            Self::Messages(messages) => messages.clone(),
        }
    }

    /// Flat form for completion-style endpoints. Turns are joined by blank
    /// lines in order.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Messages(messages) => messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// System turns joined, plus the remaining turns.
    pub fn split_system(&self) -> (Option<String>, Vec<ChatMessage>) {
        let mut system = Vec::new();
        let mut rest = Vec::new();
        for message in self.to_messages() {
            if message.role == Role::System {
                system.push(message.content);
            } else {
                rest.push(message);
            }
        }
        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, rest)
    }

    pub fn char_count(&self) -> u64 {
        match self {
            Self::Text(text) => text.chars().count() as u64,
            Self::Messages(messages) => messages
                .iter()
                .map(|m| m.content.chars().count() as u64)
                .sum(),
        }
    }
}

impl From<&str> for Prompt {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Prompt {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<ChatMessage>> for Prompt {
    fn from(value: Vec<ChatMessage>) -> Self {
        Self::Messages(value)
    }
}

/// Sampling controls. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stop: Vec<String>,
    pub seed: Option<u64>,
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Per-call options for [`Adapter::complete`](crate::Adapter::complete).
#[derive(Debug, Clone, Default)]
pub struct CompleteOptions {
    /// Model to use; defaults to the most recently loaded model.
    pub model: Option<String>,
    pub stream: bool,
    pub sampling: SamplingParams,
    pub tools: Vec<ToolSpec>,
    /// Inputs for embedding and rerank models.
    pub documents: Vec<String>,
    /// Merged into the vendor payload without overriding core keys.
    pub provider_options: Map<String, Value>,
    /// Skip the response cache for this call.
    pub bypass_cache: bool,
}

impl CompleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.sampling.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.sampling.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.sampling.top_k = Some(top_k);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.sampling.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sampling.stop = stop.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampling.seed = Some(seed);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_documents<I, S>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents = documents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provider_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.provider_options.insert(key.into(), value);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    /// Pair these options with a prompt.
    pub fn into_request(self, prompt: Prompt) -> CompletionRequest {
        CompletionRequest {
            prompt,
            sampling: self.sampling,
            stream: self.stream,
            tools: self.tools,
            documents: self.documents,
            provider_options: self.provider_options,
        }
    }
}

/// Provider-agnostic request, built fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: Prompt,
    pub sampling: SamplingParams,
    pub stream: bool,
    pub tools: Vec<ToolSpec>,
    pub documents: Vec<String>,
    pub provider_options: Map<String, Value>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<Prompt>) -> Self {
        CompleteOptions::default().into_request(prompt.into())
    }

    /// Embedding inputs: explicit documents, else the prompt text.
    pub fn embedding_inputs(&self) -> Vec<String> {
        if self.documents.is_empty() {
            vec![self.prompt.to_text()]
        } else {
            self.documents.clone()
        }
    }
}

/// Options for [`Adapter::load`](crate::Adapter::load).
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Issue a lightweight request to check the provider is reachable.
    pub probe: bool,
    /// Caller data kept on the loaded-model record.
    pub metadata: Map<String, Value>,
}

impl LoadOptions {
    pub fn with_probe(mut self) -> Self {
        self.probe = true;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_system_keeps_order_of_remaining_turns() {
        let prompt = Prompt::Messages(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::system("no emoji"),
        ]);
        let (system, rest) = prompt.split_system();
        assert_eq!(system.as_deref(), Some("be brief\n\nno emoji"));
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].role, Role::User);
        assert_eq!(rest[1].role, Role::Assistant);
    }

    #[test]
    fn embedding_inputs_fall_back_to_prompt() {
        let request = CompletionRequest::new("hello");
        assert_eq!(request.embedding_inputs(), vec!["hello".to_string()]);

        let request = CompleteOptions::new()
            .with_documents(["a", "b"])
            .into_request("ignored".into());
        assert_eq!(request.embedding_inputs(), vec!["a", "b"]);
    }
}
