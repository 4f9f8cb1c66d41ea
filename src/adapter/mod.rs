//! Provider adapter: one provider's credentials, transport and state behind
//! `load`, `complete`, `list_models`, `unload` and `dispose`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use tracing::Instrument;

use crate::catalog;
use crate::config::AdapterConfig;
use crate::error::{ErrorKind, LlmError};
use crate::execution::{HttpTransport, build_headers};
use crate::providers::{ProviderId, ProviderProfile};
use crate::retry::RetryExecutor;
use crate::standards::{NormalizedRequest, ResponseContext, build_request, canonicalize};
use crate::streaming::{StreamDecoder, decode_stream};
use crate::types::{
    CompleteOptions, Completion, CompletionRequest, CompletionResponse, LoadOptions,
    ModelDescriptor, Prompt,
};

mod batch;
mod cache;
mod state;

use batch::QueuedRequest;
use cache::ResponseCache;
use state::AdapterState;

pub use state::{CostLedger, LoadedModel, ModelSpend};

/// Results of one flushed batch, in enqueue order.
pub type BatchResults = Vec<Result<CompletionResponse, LlmError>>;

/// Adapter for a single provider. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Adapter {
    inner: Arc<Inner>,
}

struct Inner {
    provider: ProviderId,
    config: AdapterConfig,
    base_url: String,
    headers: HeaderMap,
    transport: HttpTransport,
    retry: RetryExecutor,
    cache: Option<ResponseCache>,
    state: Mutex<AdapterState>,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("provider", &self.inner.provider)
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Build an adapter. Fails when the provider needs a key and none is
    /// configured, or when its base URL cannot be derived from settings.
    pub fn new(provider: ProviderId, config: AdapterConfig) -> Result<Self, LlmError> {
        let profile = provider.profile();
        let api_key = config.api_key_str().filter(|k| !k.trim().is_empty());
        if profile.requires_key && api_key.is_none() {
            return Err(LlmError::ConfigurationError(format!(
                "{} requires an API key (set {})",
                profile.display_name,
                profile.api_key_env.join(" or ")
            )));
        }

        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => profile.resolve_base_url(&config.settings)?,
        };
        let base_url = base_url.trim_end_matches('/').to_string();
        let headers = build_headers(profile, api_key, &config.settings, &config.http)?;
        let transport = HttpTransport::new(provider, &config.http)?;

        tracing::debug!(
            provider = %provider,
            %base_url,
            api_key = %api_key.map(crate::config::mask_secret).unwrap_or_default(),
            "adapter created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                provider,
                retry: RetryExecutor::new(config.retry.clone()),
                cache: config.cache.map(ResponseCache::new),
                state: Mutex::new(AdapterState::default()),
                base_url,
                headers,
                transport,
                config,
            }),
        })
    }

    /// Adapter configured from the provider's environment variables.
    pub fn from_env(provider: ProviderId) -> Result<Self, LlmError> {
        Self::new(provider, AdapterConfig::from_env(provider))
    }

    pub fn provider(&self) -> ProviderId {
        self.inner.provider
    }

    pub fn profile(&self) -> &'static ProviderProfile {
        self.inner.provider.profile()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Describe `model_id` and make it the default model for `complete`.
    ///
    /// Ids missing from the provider's table are accepted with a warning and
    /// a zero-priced descriptor. With [`LoadOptions::probe`] the provider's
    /// model listing is fetched: an authentication failure is returned,
    /// any other failure marks the model unreachable.
    pub async fn load(
        &self,
        model_id: &str,
        options: LoadOptions,
    ) -> Result<LoadedModel, LlmError> {
        self.ensure_active()?;
        let provider = self.inner.provider;

        let (descriptor, known) = self.describe_model(model_id);

        let reachable = if options.probe {
            self.probe().await?
        } else {
            None
        };

        let loaded = LoadedModel {
            descriptor,
            loaded_at: Utc::now(),
            metadata: options.metadata,
            reachable,
            known,
        };

        let mut state = self.lock();
        state.loaded.insert(model_id.to_string(), loaded.clone());
        state.current = Some(model_id.to_string());
        drop(state);

        tracing::info!(provider = %provider, model = model_id, known, "model loaded");
        Ok(loaded)
    }

    async fn probe(&self) -> Result<Option<bool>, LlmError> {
        let Some((path, _)) = self.profile().catalog else {
            tracing::debug!(provider = %self.inner.provider, "no listing endpoint to probe");
            return Ok(None);
        };
        let url = format!("{}{path}", self.inner.base_url);
        match self.inner.transport.get_json(&url, &self.inner.headers).await {
            Ok(_) => Ok(Some(true)),
            Err(e) if e.kind() == ErrorKind::Authentication => Err(e),
            Err(e) => {
                tracing::warn!(provider = %self.inner.provider, error = %e, "reachability probe failed");
                Ok(Some(false))
            }
        }
    }

    /// Run one completion.
    ///
    /// The model is `options.model`, else the most recently loaded model.
    /// Streaming is used only when requested and supported by both the model
    /// and its endpoint; otherwise a single response is returned.
    pub async fn complete(
        &self,
        prompt: impl Into<Prompt>,
        options: CompleteOptions,
    ) -> Result<Completion, LlmError> {
        self.ensure_active()?;
        let span = tracing::info_span!(
            "complete",
            provider = %self.inner.provider,
            model = options.model.as_deref().unwrap_or_default(),
            stream = options.stream,
        );
        self.dispatch(prompt.into(), options).instrument(span).await
    }

    /// [`complete`](Self::complete) collapsed to its final response.
    pub async fn complete_response(
        &self,
        prompt: impl Into<Prompt>,
        options: CompleteOptions,
    ) -> Result<CompletionResponse, LlmError> {
        self.complete(prompt, options).await?.into_response().await
    }

    async fn dispatch(&self, prompt: Prompt, options: CompleteOptions) -> Result<Completion, LlmError> {
        let provider = self.inner.provider;
        let (model, descriptor) = self.resolve_model(options.model.as_deref())?;
        let bypass_cache = options.bypass_cache;
        let request = options.into_request(prompt);

        let normalized = build_request(&request, &descriptor, provider, &self.inner.config.settings)?;
        if request.stream && !normalized.stream {
            tracing::debug!(
                provider = %provider,
                model = %model,
                "streaming not available for this model, returning a single response"
            );
        }

        if normalized.stream {
            self.open_stream(model, descriptor, normalized).await
        } else {
            self.complete_buffered(&model, &descriptor, &request, normalized, bypass_cache)
                .await
                .map(Completion::Response)
        }
    }

    fn resolve_model(&self, requested: Option<&str>) -> Result<(String, ModelDescriptor), LlmError> {
        let (model, loaded) = {
            let state = self.lock();
            let model = match requested {
                Some(model) => model.to_string(),
                None => state.current.clone().ok_or_else(|| {
                    LlmError::validation("no model selected: load a model or set CompleteOptions::with_model")
                })?,
            };
            let loaded = state.descriptor(&model).cloned();
            (model, loaded)
        };
        let descriptor = match loaded {
            Some(descriptor) => descriptor,
            None => self.describe_model(&model).0,
        };
        Ok((model, descriptor))
    }

    /// Catalog descriptor for `model_id`, warning when the id is unknown.
    /// The flag reports whether the catalog knew the id.
    fn describe_model(&self, model_id: &str) -> (ModelDescriptor, bool) {
        let provider = self.inner.provider;
        match catalog::lookup(provider, model_id) {
            Some(descriptor) => (descriptor.clone(), true),
            None => {
                tracing::warn!(
                    provider = %provider,
                    model = model_id,
                    "unknown model, proceeding without pricing or capability data"
                );
                (ModelDescriptor::unknown(model_id), false)
            }
        }
    }

    async fn complete_buffered(
        &self,
        model: &str,
        descriptor: &ModelDescriptor,
        request: &CompletionRequest,
        normalized: NormalizedRequest,
        bypass_cache: bool,
    ) -> Result<CompletionResponse, LlmError> {
        let inner = &self.inner;
        let url = format!("{}{}", inner.base_url, normalized.endpoint.path);

        let cache = inner.cache.as_ref().filter(|_| !bypass_cache);
        let cache_key = cache.map(|_| {
            ResponseCache::key(inner.provider, &normalized.endpoint.path, &normalized.payload)
        });
        if let (Some(cache), Some(key)) = (cache, cache_key.as_deref()) {
            if let Some(hit) = cache.get(key) {
                tracing::debug!(provider = %inner.provider, model, "response cache hit");
                return Ok(hit);
            }
        }

        let body = inner
            .retry
            .execute(|| {
                inner
                    .transport
                    .post_json(&url, &inner.headers, &normalized.payload, model)
            })
            .await?;

        let ctx = ResponseContext {
            provider: inner.provider,
            descriptor,
            request,
        };
        let response = canonicalize(normalized.endpoint.format, &body, &ctx)?;
        inner.record(model, &response);

        if let (Some(cache), Some(key)) = (cache, cache_key) {
            cache.put(key, response.clone());
        }
        Ok(response)
    }

    async fn open_stream(
        &self,
        model: String,
        descriptor: ModelDescriptor,
        normalized: NormalizedRequest,
    ) -> Result<Completion, LlmError> {
        let inner = &self.inner;
        let url = format!("{}{}", inner.base_url, normalized.endpoint.path);

        // Only opening the stream is retried; once bytes flow, errors surface.
        let response = inner
            .retry
            .execute(|| {
                inner
                    .transport
                    .post_stream(&url, &inner.headers, &normalized.payload, &model)
            })
            .await?;

        let bytes = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| LlmError::StreamError(format!("failed to read stream: {e}")))
        });
        let decoder = StreamDecoder::new(normalized.endpoint.format, inner.provider, descriptor);
        let recorder = Arc::clone(&self.inner);
        let stream = decode_stream(bytes, decoder, inner.config.http.timeout, move |response| {
            recorder.record(&model, response)
        });
        Ok(Completion::Stream(stream))
    }

    /// Live model listing merged over the static table. Listing failures
    /// fall back to the static table.
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LlmError> {
        self.ensure_active()?;
        let profile = self.profile();
        let Some((path, format)) = profile.catalog else {
            return Ok(profile.models.to_vec());
        };
        let url = format!("{}{path}", self.inner.base_url);
        match self.inner.transport.get_json(&url, &self.inner.headers).await {
            Ok(body) => Ok(catalog::merge(
                profile.models,
                catalog::parse_model_catalog(format, &body),
            )),
            Err(e) => {
                tracing::debug!(provider = %self.inner.provider, error = %e, "model listing unavailable, using static table");
                Ok(profile.models.to_vec())
            }
        }
    }

    /// Forget a loaded model. Returns whether it was loaded.
    pub fn unload(&self, model_id: &str) -> Result<bool, LlmError> {
        self.ensure_active()?;
        let mut state = self.lock();
        let removed = state.loaded.remove(model_id).is_some();
        if state.current.as_deref() == Some(model_id) {
            state.current = None;
        }
        Ok(removed)
    }

    pub fn loaded_models(&self) -> Vec<LoadedModel> {
        self.lock().loaded.values().cloned().collect()
    }

    /// Snapshot of recorded spend. Empty when cost tracking is disabled.
    pub fn cost_ledger(&self) -> CostLedger {
        self.lock().ledger.clone()
    }

    /// Queue a non-streaming completion. When the queue reaches the
    /// configured batch size it is flushed and the results returned.
    pub async fn enqueue(
        &self,
        prompt: impl Into<Prompt>,
        options: CompleteOptions,
    ) -> Result<Option<BatchResults>, LlmError> {
        let Some(batch) = self.inner.config.batch else {
            return Err(LlmError::ConfigurationError(
                "batching is not enabled for this adapter".into(),
            ));
        };
        let item = QueuedRequest {
            prompt: prompt.into(),
            options,
        };
        let ready = {
            let mut state = self.lock();
            if state.disposed {
                return Err(disposed());
            }
            state.queue.push(item, batch.max_batch_size)
        };
        match ready {
            Some(items) => Ok(Some(self.run_batch(items).await)),
            None => Ok(None),
        }
    }

    /// Issue every queued call now.
    pub async fn flush(&self) -> Result<BatchResults, LlmError> {
        self.ensure_active()?;
        let items = self.lock().queue.drain();
        Ok(self.run_batch(items).await)
    }

    pub fn pending_batch_len(&self) -> usize {
        self.lock().queue.len()
    }

    async fn run_batch(&self, items: Vec<QueuedRequest>) -> BatchResults {
        if items.is_empty() {
            return Vec::new();
        }
        tracing::debug!(provider = %self.inner.provider, size = items.len(), "flushing batch");
        let calls = items.into_iter().map(|item| {
            let mut options = item.options;
            options.stream = false;
            async move {
                match self.dispatch(item.prompt, options).await? {
                    Completion::Response(response) => Ok(response),
                    stream @ Completion::Stream(_) => stream.into_response().await,
                }
            }
        });
        futures::future::join_all(calls).await
    }

    /// Issue any queued calls, then drop all state. Every later operation
    /// fails with a configuration error; a second `dispose` is a no-op.
    pub async fn dispose(&self) -> Result<BatchResults, LlmError> {
        let pending = {
            let mut state = self.lock();
            if state.disposed {
                return Ok(Vec::new());
            }
            state.disposed = true;
            state.queue.drain()
        };
        let results = self.run_batch(pending).await;

        self.lock().clear();
        if let Some(cache) = &self.inner.cache {
            cache.clear();
        }
        tracing::debug!(provider = %self.inner.provider, flushed = results.len(), "adapter disposed");
        Ok(results)
    }

    fn ensure_active(&self) -> Result<(), LlmError> {
        if self.lock().disposed {
            Err(disposed())
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, AdapterState> {
        self.inner.lock()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, AdapterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, model: &str, response: &CompletionResponse) {
        if self.config.track_costs {
            self.lock().ledger.record(model, response);
        }
    }
}

fn disposed() -> LlmError {
    LlmError::ConfigurationError("adapter has been disposed".into())
}
