//! OpenAI-compatible `/embeddings` client.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use newsroom_core::config::EmbeddingSettings;
use newsroom_core::traits::EmbeddingProvider;
use newsroom_core::{EmbeddingVector, ProviderError, ProviderErrorCode};

use crate::http;

/// Blocking embeddings client. Retries transport errors, 429 and 5xx with
/// exponential backoff, up to `max_retries` extra attempts.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    dim: usize,
    id: String,
    max_retries: usize,
    retry_base: Duration,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimensions: Option<usize>,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self, ProviderError> {
        if model.trim().is_empty() {
            return Err(ProviderError::new(ProviderErrorCode::Config, "missing embedding model name"));
        }
        let dim = match dimensions.or_else(|| native_dimension(model)) {
            Some(d) if d > 0 => d,
            _ => {
                return Err(ProviderError::new(
                    ProviderErrorCode::Config,
                    format!("unknown output dimension for model '{}'; set embedding.dimensions", model),
                ))
            }
        };
        let client = http::build_client(api_key, timeout)?;
        Ok(Self {
            client,
            endpoint: http::endpoint(base_url, "embeddings"),
            model: model.to_string(),
            dimensions,
            dim,
            id: format!("openai:{}:d{}", model, dim),
            max_retries,
            retry_base: Duration::from_millis(500),
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, ProviderError> {
        let api_key = http::api_key_from_env(&settings.api_key_env)?;
        Self::new(
            &api_key,
            &settings.base_url,
            &settings.model,
            settings.dimensions,
            Duration::from_secs(settings.timeout_secs),
            settings.max_retries,
        )
    }

    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    fn request_once(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let request = EmbeddingRequest { model: &self.model, input: [text], dimensions: self.dimensions };
        let resp = self.client.post(&self.endpoint).json(&request).send().map_err(|e| http::transport_error(&e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(http::status_error(status, &body));
        }
        let parsed: EmbeddingResponse = resp.json().map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse embedding response: {}", e))
        })?;
        let embedding = parsed
            .data
            .into_iter()
            .min_by_key(|entry| entry.index)
            .map(|entry| entry.embedding)
            .ok_or_else(|| ProviderError::invalid_response("embedding response has no data"))?;
        if embedding.len() != self.dim {
            return Err(ProviderError::invalid_response(format!(
                "expected {} dimensions, got {}",
                self.dim,
                embedding.len()
            )));
        }
        Ok(embedding)
    }
}

impl EmbeddingProvider for OpenAiEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let mut attempt = 0usize;
        loop {
            match self.request_once(text) {
                Ok(v) => {
                    debug!(model = %self.model, chars = text.len(), attempt, "embedded text");
                    return Ok(v);
                }
                Err(err) if http::is_retryable(err.code) && attempt < self.max_retries => {
                    let delay = http::backoff(self.retry_base, attempt);
                    warn!(error = %err, attempt, ?delay, "embedding request failed, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Output size of the hosted embedding models when no `dimensions` is requested.
fn native_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
