//! # llm-relay
//!
//! One canonical completion contract over many LLM vendor APIs.
//!
//! An [`Adapter`] wraps a single provider: it resolves model metadata from
//! the built-in tables, translates a provider-agnostic [`CompletionRequest`]
//! into the vendor's wire format, classifies vendor failures into
//! [`LlmError`], decodes streamed responses incrementally, and reports a
//! [`CompletionResponse`] with usage and cost in one shape regardless of
//! vendor. [`AdapterRegistry`] maps provider names and aliases to adapters.
//!
//! ```rust,no_run
//! use llm_relay::prelude::*;
//!
//! # async fn run() -> Result<(), LlmError> {
//! let adapter = AdapterRegistry::builtin()
//!     .create_adapter("openai", AdapterConfig::from_env(ProviderId::OpenAi))?;
//! adapter.load("gpt-4o-mini", LoadOptions::default()).await?;
//!
//! let response = adapter
//!     .complete_response("Say hello", CompleteOptions::new().with_max_tokens(32))
//!     .await?;
//! println!("{} (${:.6})", response.text, response.cost);
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod cost;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod providers;
pub mod registry;
pub mod retry;
pub mod standards;
pub mod streaming;
pub mod telemetry;
pub mod types;

pub use adapter::{Adapter, BatchResults, CostLedger, LoadedModel, ModelSpend};
pub use config::{AdapterConfig, BatchConfig, CacheConfig, HttpConfig, ProviderSettings};
pub use error::{ErrorKind, LlmError};
pub use providers::{ProviderCategory, ProviderId, ProviderProfile};
pub use registry::AdapterRegistry;
pub use retry::RetryPolicy;
pub use streaming::StreamDecoder;
pub use types::*;

/// Common imports.
pub mod prelude {
    pub use crate::adapter::Adapter;
    pub use crate::config::AdapterConfig;
    pub use crate::error::{ErrorKind, LlmError};
    pub use crate::providers::ProviderId;
    pub use crate::registry::AdapterRegistry;
    pub use crate::types::{
        ChatMessage, CompleteOptions, Completion, CompletionEvent, CompletionResponse, Feature,
        LoadOptions, Modality, Prompt, ToolSpec, Usage,
    };
}
