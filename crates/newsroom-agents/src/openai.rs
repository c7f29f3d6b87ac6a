use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use newsroom_core::config::WriterSettings;
use newsroom_core::traits::GenerativeProvider;
use newsroom_core::{ProviderError, ProviderErrorCode};
use newsroom_embed::http;

const SYSTEM_PROMPT: &str = "You are an experienced newspaper journalist. \
You write clear, engaging articles and only state facts found in the material you are given.";

/// OpenAI-compatible `/chat/completions` client. Single attempt per call.
pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl OpenAiChat {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        temperature: f32,
        max_tokens: usize,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if model.trim().is_empty() {
            return Err(ProviderError::new(ProviderErrorCode::Config, "missing chat model name"));
        }
        Ok(Self {
            client: http::build_client(api_key, timeout)?,
            endpoint: http::endpoint(base_url, "chat/completions"),
            model: model.to_string(),
            temperature,
            max_tokens,
        })
    }

    pub fn from_settings(settings: &WriterSettings) -> Result<Self, ProviderError> {
        let api_key = http::api_key_from_env(&settings.api_key_env)?;
        Self::new(
            &api_key,
            &settings.base_url,
            &settings.model,
            settings.temperature,
            settings.max_tokens,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn model(&self) -> &str { &self.model }
}

impl GenerativeProvider for OpenAiChat {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
        };
        let resp = self.client.post(&self.endpoint).json(&body).send().map_err(|e| http::transport_error(&e))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(http::status_error(status, &text));
        }
        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| ProviderError::invalid_response(format!("failed to parse chat response: {}", e)))?;
        let answer = parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::invalid_response("chat response has no message content"))?;
        debug!(model = %self.model, prompt_chars = prompt.len(), answer_chars = answer.len(), "chat completion");
        Ok(answer)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
