//! HTTP client for the generation backend.
//!
//! Speaks the backend's two endpoints: `POST /v1/generate` for a
//! finished reply and `POST /v1/generate/stream` for SSE fragments.
//! In `StreamMode::Chunked` the direct endpoint is called and the
//! finished text replayed locally as a fragment stream, so deployments
//! without a streaming backend still get the incremental client
//! experience.

use charla_core::generation::ResponseGenerator;
use charla_types::config::{GenerationConfig, StreamMode};
use charla_types::generation::{Fragment, GenerationError, GenerationRequest, GenerationResponse};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::stream::{BackendStream, ChunkedStream, FragmentSource, SseStream};

/// Terminal SSE data sentinel emitted by the backend.
const SSE_DONE: &str = "[DONE]";

/// reqwest-backed implementation of `ResponseGenerator`.
pub struct HttpResponseGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    stream_mode: StreamMode,
    chunk_chars: usize,
    request_timeout_ms: u64,
}

impl HttpResponseGenerator {
    /// Build a generator from config. The API key, when configured, is
    /// read from the named environment variable at startup.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = match &config.api_key_env {
            Some(var) => match std::env::var(var) {
                Ok(key) => Some(SecretString::from(key)),
                Err(_) => {
                    warn!(var, "Backend API key env var not set, proceeding without auth");
                    None
                }
            },
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| GenerationError::Backend {
                message: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            stream_mode: config.stream_mode,
            chunk_chars: config.chunk_chars,
            request_timeout_ms: config.request_timeout_ms,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        builder
    }

    fn map_request_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.request_timeout_ms)
        } else if err.is_connect() {
            GenerationError::Backend {
                message: format!("connection failed: {err}"),
            }
        } else {
            GenerationError::Backend {
                message: err.to_string(),
            }
        }
    }

    async fn fetch_direct(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let response = self
            .post("/v1/generate")
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                message: format!("backend returned {status}: {body}"),
            });
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| GenerationError::Deserialization(e.to_string()))
    }

    async fn open_sse(&self, request: &GenerationRequest) -> Result<SseStream, GenerationError> {
        let response = self
            .post("/v1/generate/stream")
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                message: format!("backend returned {status}: {body}"),
            });
        }

        let mut events = response.bytes_stream().eventsource();
        let source: FragmentSource = Box::pin(async_stream::try_stream! {
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| GenerationError::Stream(e.to_string()))?;
                if event.data == SSE_DONE {
                    break;
                }
                let fragment: Fragment = serde_json::from_str(&event.data)
                    .map_err(|e| GenerationError::Deserialization(format!(
                        "fragment event: {e}"
                    )))?;
                yield fragment;
            }
        });

        Ok(SseStream::new(source))
    }
}

impl ResponseGenerator for HttpResponseGenerator {
    type Stream = BackendStream;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        debug!(character = %request.character_id, history_len = request.history.len(), "Direct generation request");
        self.fetch_direct(request).await
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<Self::Stream, GenerationError> {
        match self.stream_mode {
            StreamMode::Incremental => {
                debug!(character = %request.character_id, "Opening SSE fragment stream");
                Ok(BackendStream::Sse(self.open_sse(&request).await?))
            }
            StreamMode::Chunked | StreamMode::Direct => {
                debug!(character = %request.character_id, "Simulating stream from direct response");
                let response = self.fetch_direct(&request).await?;
                Ok(BackendStream::Chunked(ChunkedStream::new(
                    response,
                    self.chunk_chars,
                )))
            }
        }
    }
}
