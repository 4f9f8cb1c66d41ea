//! Shared helpers for integration tests: mock-server adapters and SSE fixtures.
#![allow(dead_code)]

use std::time::Duration;

use llm_relay::{Adapter, AdapterConfig, CompletionEvent, LlmError, ProviderId, RetryPolicy};
use wiremock::MockServer;

/// Retry policy with millisecond delays so retry tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(max_attempts)
        .with_initial_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
        .with_jitter(false)
}

/// Config pointed at `server`, no retries.
pub fn mock_config(server: &MockServer) -> AdapterConfig {
    AdapterConfig::new()
        .with_api_key("test-key-0123456789")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy::none())
}

pub fn mock_adapter(provider: ProviderId, server: &MockServer) -> Adapter {
    Adapter::new(provider, mock_config(server)).expect("adapter builds")
}

/// Raw bytes of `tests/fixtures/<path>`, line endings normalized to `\n`.
pub fn fixture(path: &str) -> String {
    let full = format!("{}/tests/fixtures/{path}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&full)
        .unwrap_or_else(|e| panic!("fixture {full}: {e}"))
        .replace("\r\n", "\n")
}

/// Concatenated chunk texts and the final response of an event list.
pub fn split_events(
    events: Vec<Result<CompletionEvent, LlmError>>,
) -> (String, Option<llm_relay::CompletionResponse>) {
    let mut text = String::new();
    let mut last = None;
    for event in events {
        match event.expect("no stream error") {
            CompletionEvent::Chunk { text: delta, .. } => text.push_str(&delta),
            CompletionEvent::Final(response) => last = Some(response),
        }
    }
    (text, last)
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}
