//! HTTP transport.

use bytes::Bytes;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use serde_json::Value;

use super::errors::classify_http_error;
use crate::config::{HttpConfig, ProviderSettings};
use crate::error::LlmError;
use crate::providers::{AuthScheme, ProviderId, ProviderProfile};

/// Build the header set sent on every request to `profile`'s provider.
pub fn build_headers(
    profile: &ProviderProfile,
    api_key: Option<&str>,
    settings: &ProviderSettings,
    http: &HttpConfig,
) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, header_value(&http.user_agent)?);

    if let Some(key) = api_key {
        match profile.auth {
            AuthScheme::Bearer => {
                headers.insert(AUTHORIZATION, header_value(&format!("Bearer {key}"))?);
            }
            AuthScheme::Header(name) => {
                headers.insert(header_name(name)?, header_value(key)?);
            }
        }
    }
    for (name, value) in profile.extra_headers(settings) {
        headers.insert(header_name(name)?, header_value(&value)?);
    }
    for (name, value) in &http.headers {
        headers.insert(header_name(name)?, header_value(value)?);
    }
    Ok(headers)
}

fn header_name(name: &str) -> Result<HeaderName, LlmError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| LlmError::ConfigurationError(format!("invalid header name '{name}': {e}")))
}

// Values may hold credentials, so they stay out of the message.
fn header_value(value: &str) -> Result<HeaderValue, LlmError> {
    HeaderValue::from_str(value)
        .map_err(|e| LlmError::ConfigurationError(format!("invalid header value: {e}")))
}

/// One provider's HTTP clients. Buffered calls use a whole-request timeout;
/// streaming calls only bound the connect phase, the decoder bounds idle
/// gaps between chunks.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    provider: ProviderId,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(provider: ProviderId, http: &HttpConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(http.timeout)
            .connect_timeout(http.connect_timeout)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("failed to build HTTP client: {e}")))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(http.connect_timeout)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            provider,
            client,
            stream_client,
        })
    }

    /// POST `payload` and return the body of a 2xx response. Other statuses
    /// are classified.
    pub async fn post_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        payload: &Value,
        model: &str,
    ) -> Result<Bytes, LlmError> {
        tracing::debug!(provider = %self.provider, %url, model, "sending request");
        let response = self
            .client
            .post(url)
            .headers(headers.clone())
            .json(payload)
            .send()
            .await?;
        self.read_success(response, model).await
    }

    /// POST `payload` and hand back the open response for incremental
    /// reading. Only the status line and headers have been received.
    pub async fn post_stream(
        &self,
        url: &str,
        headers: &HeaderMap,
        payload: &Value,
        model: &str,
    ) -> Result<reqwest::Response, LlmError> {
        tracing::debug!(provider = %self.provider, %url, model, "opening stream");
        let response = self
            .stream_client
            .post(url)
            .headers(headers.clone())
            .header(ACCEPT, "text/event-stream")
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let headers = response.headers().clone();
        let body = response.bytes().await.unwrap_or_default();
        Err(classify_http_error(self.provider, status.as_u16(), &body, &headers, model))
    }

    /// GET a JSON document, such as a model listing.
    pub async fn get_json(&self, url: &str, headers: &HeaderMap) -> Result<Value, LlmError> {
        tracing::debug!(provider = %self.provider, %url, "fetching");
        let mut headers = headers.clone();
        headers.remove(CONTENT_TYPE);
        let response = self.client.get(url).headers(headers).send().await?;
        let body = self.read_success(response, "").await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn read_success(&self, response: reqwest::Response, model: &str) -> Result<Bytes, LlmError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        if status.is_success() {
            Ok(body)
        } else {
            let err = classify_http_error(self.provider, status.as_u16(), &body, &headers, model);
            tracing::debug!(provider = %self.provider, status = status.as_u16(), error = %err, "request failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_auth_scheme_uses_vendor_header() {
        let profile = ProviderId::Anthropic.profile();
        let headers = build_headers(
            profile,
            Some("sk-ant-test"),
            &ProviderSettings::default(),
            &HttpConfig::default(),
        )
        .unwrap();
        assert_eq!(headers["x-api-key"], "sk-ant-test");
        assert_eq!(headers["anthropic-version"], "2023-06-01");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_scheme_and_custom_headers() {
        let mut http = HttpConfig::default();
        http.headers.insert("x-team".into(), "search".into());
        let headers = build_headers(
            ProviderId::Groq.profile(),
            Some("gsk_test"),
            &ProviderSettings::default(),
            &http,
        )
        .unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer gsk_test");
        assert_eq!(headers["x-team"], "search");
    }

    #[test]
    fn invalid_header_value_is_a_configuration_error() {
        let err = build_headers(
            ProviderId::OpenAi.profile(),
            Some("bad\nkey"),
            &ProviderSettings::default(),
            &HttpConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
