//! Batch queue flushing and adapter disposal.

mod support;

use llm_relay::prelude::*;
use serde_json::json;
use support::mock_config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_answering(expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "done"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 2, "completion_tokens": 1, "total_tokens": 3}
        })))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

fn batching_adapter(server: &MockServer, size: usize) -> Adapter {
    Adapter::new(ProviderId::OpenAi, mock_config(server).with_batching(size)).unwrap()
}

fn options() -> CompleteOptions {
    CompleteOptions::new().with_model("gpt-4o-mini")
}

#[tokio::test]
async fn queue_flushes_at_batch_size_and_dispose_drains_the_rest() {
    let server = server_answering(3).await;
    let adapter = batching_adapter(&server, 2);

    assert!(adapter.enqueue("one", options()).await.unwrap().is_none());
    assert_eq!(adapter.pending_batch_len(), 1);

    let flushed = adapter.enqueue("two", options()).await.unwrap().expect("batch full");
    assert_eq!(flushed.len(), 2);
    assert!(flushed.iter().all(|r| r.as_ref().is_ok_and(|r| r.text == "done")));
    assert_eq!(adapter.pending_batch_len(), 0);

    // Streaming requests are issued as single responses inside a batch.
    assert!(adapter.enqueue("three", options().streaming()).await.unwrap().is_none());

    let drained = adapter.dispose().await.unwrap();
    assert_eq!(drained.len(), 1);
    assert!(drained[0].is_ok());
    assert_eq!(adapter.pending_batch_len(), 0);
}

#[tokio::test]
async fn batch_results_keep_enqueue_order_and_per_item_errors() {
    let server = server_answering(1).await;
    let adapter = batching_adapter(&server, 2);

    adapter
        .enqueue("bad", CompleteOptions::new().with_model("gpt-4o").with_stop(["1", "2", "3", "4", "5"]))
        .await
        .unwrap();
    let results = adapter.enqueue("good", options()).await.unwrap().unwrap();

    assert_eq!(results[0].as_ref().unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(results[1].as_ref().unwrap().text, "done");
}

#[tokio::test]
async fn explicit_flush_issues_pending_calls() {
    let server = server_answering(2).await;
    let adapter = batching_adapter(&server, 10);
    adapter.enqueue("a", options()).await.unwrap();
    adapter.enqueue("b", options()).await.unwrap();

    let results = adapter.flush().await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(adapter.flush().await.unwrap().is_empty());
}

#[tokio::test]
async fn enqueue_requires_batching() {
    let server = server_answering(0).await;
    let adapter = Adapter::new(ProviderId::OpenAi, mock_config(&server)).unwrap();
    let err = adapter.enqueue("x", options()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn disposed_adapter_rejects_everything_and_dispose_is_idempotent() {
    let server = server_answering(0).await;
    let adapter = batching_adapter(&server, 4);
    adapter.load("gpt-4o-mini", LoadOptions::default()).await.unwrap();

    assert!(adapter.dispose().await.unwrap().is_empty());
    assert!(adapter.dispose().await.unwrap().is_empty());
    assert!(adapter.loaded_models().is_empty());

    let clone = adapter.clone();
    for err in [
        clone.complete("x", options()).await.unwrap_err(),
        clone.load("gpt-4o", LoadOptions::default()).await.unwrap_err(),
        clone.list_models().await.unwrap_err(),
        clone.unload("gpt-4o").unwrap_err(),
        clone.enqueue("x", options()).await.unwrap_err(),
        clone.flush().await.unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("disposed"));
    }
}

#[tokio::test]
async fn clones_share_state() {
    let server = server_answering(1).await;
    let adapter = batching_adapter(&server, 8);
    let clone = adapter.clone();

    adapter.load("gpt-4o-mini", LoadOptions::default()).await.unwrap();
    clone.complete_response("hi", CompleteOptions::new()).await.unwrap();

    assert_eq!(adapter.cost_ledger().total_requests, 1);
    assert_eq!(clone.loaded_models().len(), 1);
}
