//! HTTP error classification.
//!
//! Maps a non-2xx vendor response onto the closed [`LlmError`] taxonomy.
//! The status code decides the kind; the body only separates a missing model
//! from other 400/404 failures. Messages come from the vendor's error
//! envelope, never from the raw JSON body, which is kept as `original`.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::LlmError;
use crate::providers::ProviderId;

/// Request/trace identifiers worth surfacing in error messages.
const REQUEST_ID_HEADERS: [&str; 6] = [
    "x-request-id",
    "request-id",
    "x-amzn-requestid",
    "x-goog-request-id",
    "cf-ray",
    "x-trace-id",
];

const BODY_SAMPLE_CHARS: usize = 200;

/// Classify a failed response. `model` is the id the request targeted.
pub fn classify_http_error(
    provider: ProviderId,
    status: u16,
    body: &[u8],
    headers: &HeaderMap,
    model: &str,
) -> LlmError {
    let text = String::from_utf8_lossy(body);
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let lower = text.to_lowercase();

    let mut message = match &parsed {
        Some(body) => extract_message(body).unwrap_or_else(|| match envelope_label(body) {
            Some(label) => format!("HTTP {status} ({label})"),
            None => format!("HTTP {status}"),
        }),
        None => {
            let sample: String = text.chars().take(BODY_SAMPLE_CHARS).collect();
            if sample.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                sample
            }
        }
    };
    let ids = request_ids(headers);
    if !ids.is_empty() {
        message = format!("{message} [{ids}]");
    }

    let original = parsed.or_else(|| (!text.trim().is_empty()).then(|| Value::String(text.to_string())));
    let provider_name = provider.as_str().to_string();

    match status {
        401 => LlmError::AuthenticationError {
            provider: provider_name,
            message,
            original,
        },
        402 => LlmError::QuotaExceededError {
            provider: provider_name,
            message,
            original,
        },
        429 => LlmError::RateLimitedError {
            provider: provider_name,
            message,
            retry_after: retry_after_secs(headers),
            attempts: 1,
            original,
        },
        400 | 404 if is_model_unavailable(&lower) => LlmError::ModelUnavailableError {
            provider: provider_name,
            model: model.to_string(),
            message,
            original,
        },
        500..=599 => LlmError::ServiceUnavailableError {
            provider: provider_name,
            status,
            message,
            attempts: 1,
            original,
        },
        _ => LlmError::ProviderError {
            provider: provider_name,
            status: Some(status),
            message,
            original,
        },
    }
}

fn is_model_unavailable(lower: &str) -> bool {
    if lower.contains("model_not_found") {
        return true;
    }
    lower.contains("model")
        && [
            "not found",
            "does not exist",
            "not supported",
            "unavailable",
            "decommissioned",
            "deprecated",
        ]
        .iter()
        .any(|needle| lower.contains(needle))
}

/// Human message from the common vendor error envelopes.
fn extract_message(body: &Value) -> Option<String> {
    // Gemini and Vertex wrap errors in a one-element array.
    if let Some(first) = body.as_array().and_then(|items| items.first()) {
        return extract_message(first);
    }
    let candidates = [
        body.pointer("/error/message"),
        body.get("error").filter(|e| e.is_string()),
        body.get("message"),
        body.get("detail"),
        body.pointer("/errors/0/message"),
        body.pointer("/errors/0"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
}

/// Short machine label (`code` or `type`) from an envelope with no message.
fn envelope_label(body: &Value) -> Option<String> {
    if let Some(first) = body.as_array().and_then(|items| items.first()) {
        return envelope_label(first);
    }
    let error = body.get("error").filter(|e| e.is_object()).unwrap_or(body);
    ["code", "type", "status"]
        .into_iter()
        .filter_map(|key| error.get(key).and_then(Value::as_str))
        .find(|label| !label.trim().is_empty())
        .map(str::to_string)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn request_ids(headers: &HeaderMap) -> String {
    REQUEST_ID_HEADERS
        .iter()
        .filter_map(|name| header_str(headers, name).map(|v| format!("{name}={v}")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wait hint in whole seconds from `retry-after-ms` or `retry-after`
/// (delta-seconds or HTTP-date).
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    if let Some(ms) = header_str(headers, "retry-after-ms").and_then(|v| v.trim().parse::<f64>().ok()) {
        if ms.is_finite() && ms >= 0.0 {
            return Some((ms / 1000.0).ceil() as u64);
        }
    }
    let raw = header_str(headers, "retry-after")?.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }
    if let Ok(secs) = raw.parse::<f64>() {
        return (secs.is_finite() && secs >= 0.0).then(|| secs.ceil() as u64);
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let wait = (at - Utc::now()).num_seconds();
    Some(wait.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let err = classify_http_error(
            ProviderId::OpenAi,
            429,
            br#"{"error":{"message":"Rate limit reached","type":"requests"}}"#,
            &headers(&[("retry-after", "5")]),
            "gpt-4o",
        );
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.retry_after(), Some(5));
        assert!(err.to_string().contains("Rate limit reached"));
        assert!(err.is_retryable());
    }

    #[test]
    fn status_code_decides_the_kind() {
        let err = classify_http_error(
            ProviderId::OpenAi,
            429,
            br#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#,
            &HeaderMap::new(),
            "gpt-4o",
        );
        assert_eq!(err.kind(), ErrorKind::RateLimited);

        let err = classify_http_error(
            ProviderId::Gemini,
            403,
            br#"{"error":{"message":"Permission denied on resource project","status":"PERMISSION_DENIED"}}"#,
            &HeaderMap::new(),
            "gemini-2.0-flash",
        );
        assert_eq!(err.kind(), ErrorKind::Provider);

        let err = classify_http_error(
            ProviderId::Anthropic,
            402,
            br#"{"error":{"message":"Your credit balance is too low"}}"#,
            &HeaderMap::new(),
            "claude-3-haiku-20240307",
        );
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
        assert!(!err.is_retryable());
    }

    #[test]
    fn json_body_without_message_never_becomes_the_message() {
        let body = br#"{"code":"overloaded","type":"server_error"}"#;
        let err = classify_http_error(ProviderId::Mistral, 503, body, &HeaderMap::new(), "mistral-large-latest");
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        let message = err.to_string();
        assert!(message.contains("HTTP 503 (overloaded)"), "{message}");
        assert!(!message.contains('{'), "{message}");
        assert_eq!(err.original().and_then(|o| o.get("type")), Some(&Value::from("server_error")));

        let err = classify_http_error(ProviderId::Groq, 500, br#"{"ok":false}"#, &HeaderMap::new(), "llama-3.1-8b-instant");
        assert!(err.to_string().contains("HTTP 500"));
        assert!(!err.to_string().contains("false"));
    }

    #[test]
    fn unauthorized_preserves_original_payload() {
        let err = classify_http_error(
            ProviderId::Anthropic,
            401,
            br#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
            &headers(&[("request-id", "req_123")]),
            "claude-3-haiku-20240307",
        );
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(err.to_string().contains("req_123"));
        assert_eq!(
            err.original().and_then(|o| o.pointer("/error/type")),
            Some(&Value::String("authentication_error".into()))
        );
    }

    #[test]
    fn unknown_model_404_is_model_unavailable() {
        let err = classify_http_error(
            ProviderId::OpenAi,
            404,
            br#"{"error":{"message":"The model `gpt-9` does not exist","code":"model_not_found"}}"#,
            &HeaderMap::new(),
            "gpt-9",
        );
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = classify_http_error(ProviderId::Cohere, 503, b"upstream down", &HeaderMap::new(), "command-r");
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn gemini_array_envelope_message() {
        let err = classify_http_error(
            ProviderId::Gemini,
            400,
            br#"[{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}]"#,
            &HeaderMap::new(),
            "gemini-2.0-flash",
        );
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.to_string().contains("Invalid JSON payload"));
    }

    #[test]
    fn retry_after_variants() {
        assert_eq!(retry_after_secs(&headers(&[("retry-after-ms", "1500")])), Some(2));
        assert_eq!(retry_after_secs(&headers(&[("retry-after", "2.2")])), Some(3));
        assert_eq!(
            retry_after_secs(&headers(&[("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT")])),
            Some(0)
        );
        assert_eq!(retry_after_secs(&HeaderMap::new()), None);
    }
}
