//! Gemini generateContent client.
//!
//! POST {api_base}/models/{model}:generateContent

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{body_excerpt, non_empty_env, ModelClient, TransportError};
use crate::config::ModelConfig;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// HTTP client for the Gemini API.
pub struct GeminiApiClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
    label: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiApiClient {
    /// Create a client with an explicit API key.
    pub fn new(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(concat!("visionboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: config.name.trim().to_string(),
            label: format!("{} (api)", config.name.trim()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Create a client from `GEMINI_API_KEY` / `GOOGLE_API_KEY`, honoring
    /// a `GEMINI_API_BASE` override.
    pub fn from_env(config: &ModelConfig) -> Result<Self, TransportError> {
        let key = non_empty_env("GEMINI_API_KEY")
            .or_else(|| non_empty_env("GOOGLE_API_KEY"))
            .ok_or(TransportError::MissingApiKey("GEMINI_API_KEY or GOOGLE_API_KEY"))?;

        let mut client = Self::new(config, key)?;
        if let Some(base) = non_empty_env("GEMINI_API_BASE") {
            client = client.api_base(base);
        }
        Ok(client)
    }

    /// Override the API base URL.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        let model_path = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            }
        })
    }

    async fn generate_async(&self, prompt: &str) -> Result<String, TransportError> {
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling Gemini API");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else {
                    TransportError::Network(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                body: body_excerpt(&body, 500),
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| TransportError::UnexpectedResponse(format!("{}: {}", e, body_excerpt(&body, 200))))?;

        candidate_text(&value).ok_or_else(|| {
            TransportError::UnexpectedResponse(format!("no candidate text in {}", body_excerpt(&body, 300)))
        })
    }
}

impl ModelClient for GeminiApiClient {
    fn name(&self) -> &str {
        &self.label
    }

    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.generate_async(prompt))
    }
}

/// Concatenated text parts of the first candidate, trimmed.
fn candidate_text(value: &Value) -> Option<String> {
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        return None;
    }
    Some(texts.concat().trim().to_string())
}
