//! Vendor failures map onto the error taxonomy; only transient kinds retry.

mod support;

use llm_relay::prelude::*;
use serde_json::json;
use support::{fast_retry, fixture, mock_config};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok_body() -> serde_json::Value {
    json!({
        "model": "gpt-4o",
        "choices": [{"message": {"role": "assistant", "content": "recovered"}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
    })
}

fn adapter(server: &MockServer, attempts: u32) -> Adapter {
    Adapter::new(
        ProviderId::OpenAi,
        mock_config(server).with_retry(fast_retry(attempts)),
    )
    .unwrap()
}

fn options() -> CompleteOptions {
    CompleteOptions::new().with_model("gpt-4o")
}

#[tokio::test]
async fn rate_limit_carries_retry_after_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "5")
                .insert_header("x-request-id", "req_123")
                .set_body_json(json!({
                    "error": {"message": "Rate limit reached for gpt-4o", "type": "requests"}
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server, 1)
        .complete("hi", options())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.retry_after(), Some(5));
    assert_eq!(err.attempts(), 1);
    assert!(err.to_string().contains("Rate limit reached"));
    assert!(err.to_string().contains("req_123"));
    assert!(err.original().is_some());
}

#[tokio::test]
async fn authentication_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server, 4)
        .complete("hi", options())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn status_429_is_rate_limited_whatever_the_body_says() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "You exceeded your current quota", "type": "insufficient_quota"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let err = adapter(&server, 2)
        .complete("hi", options())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.attempts(), 2);
}

#[tokio::test]
async fn payment_required_is_quota_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {"code": "insufficient_credits"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server, 3)
        .complete("hi", options())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    assert!(err.to_string().contains("HTTP 402 (insufficient_credits)"));
    assert!(!err.to_string().contains('{'));
}

#[tokio::test]
async fn transient_5xx_is_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let response = adapter(&server, 3)
        .complete_response("hi", options())
        .await
        .unwrap();
    assert_eq!(response.text, "recovered");
}

#[tokio::test]
async fn exhausted_retries_report_attempt_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let err = adapter(&server, 3)
        .complete("hi", options())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert_eq!(err.attempts(), 3);
    assert!(err.to_string().contains("bad gateway"));
}

#[tokio::test]
async fn retry_after_zero_retries_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(&server)
        .await;

    let response = adapter(&server, 2)
        .complete_response("hi", options())
        .await
        .unwrap();
    assert_eq!(response.text, "recovered");
}

#[tokio::test]
async fn missing_model_is_model_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "message": "The model `gpt-4o` does not exist or you do not have access to it.",
                "code": "model_not_found"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server, 3)
        .complete("hi", options())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    match err {
        LlmError::ModelUnavailableError { model, .. } => assert_eq!(model, "gpt-4o"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_success_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = adapter(&server, 1)
        .complete("hi", options())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn stream_opening_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(fixture("openai/chat_with_usage.sse"), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let completion = adapter(&server, 2)
        .complete("hi", CompleteOptions::new().with_model("gpt-4o-mini").streaming())
        .await
        .unwrap();
    assert!(completion.is_stream());
    let response = completion.into_response().await.unwrap();
    assert_eq!(response.usage, Some(Usage::new(12, 4)));
}

#[tokio::test]
async fn error_frame_mid_stream_ends_the_stream() {
    use futures_util::StreamExt;

    let body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_9\",\"model\":\"claude-3-5-haiku-20241022\",\"usage\":{\"input_tokens\":5,\"output_tokens\":0}}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"partial\"}}\n\n",
        "event: error\n",
        "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let adapter = Adapter::new(ProviderId::Anthropic, mock_config(&server)).unwrap();
    let Completion::Stream(mut stream) = adapter
        .complete(
            "hi",
            CompleteOptions::new()
                .with_model("claude-3-5-haiku-20241022")
                .streaming(),
        )
        .await
        .unwrap()
    else {
        panic!("expected a stream");
    };

    let first = stream.next().await.unwrap().unwrap();
    assert!(matches!(first, CompletionEvent::Chunk { ref text, .. } if text == "partial"));
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(err.to_string().contains("Overloaded"));
    assert!(stream.next().await.is_none());
    assert_eq!(adapter.cost_ledger().total_requests, 0);
}
