//! Model transports.
//!
//! The pipeline only needs "prompt in, text out": [`ModelClient`] is that
//! capability. Implementations:
//! - Gemini generateContent over HTTPS ([`GeminiApiClient`])
//! - the Gemini CLI as a subprocess ([`GeminiCliClient`])
//!
//! Scene images for the collage come from [`OpenAiImageClient`].
//!
//! No transport retries; a failure is reported once to the caller.

mod cli;
mod gemini;
mod images;

pub use cli::{resolve_gemini_bin, GeminiCliClient};
pub use gemini::{GeminiApiClient, DEFAULT_GEMINI_API_BASE};
pub use images::{OpenAiImageClient, SceneImage, DEFAULT_OPENAI_API_BASE};

use std::time::Duration;
use thiserror::Error;

use crate::config::{ModelConfig, Transport};

/// Errors from a model call.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no API key found; set {0} (a .env file in the working directory also works)")]
    MissingApiKey(&'static str),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("unexpected response format: {0}")]
    UnexpectedResponse(String),
    #[error("could not locate the Gemini CLI; set GEMINI_BIN, put `gemini` on PATH, or install Node for npx")]
    BinaryNotFound,
    #[error("model process exited with status {code:?}: {stderr}")]
    Process { code: Option<i32>, stderr: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A function from prompt to model text.
pub trait ModelClient {
    /// Short label for progress output, e.g. "gemini-1.5-flash (api)".
    fn name(&self) -> &str;

    /// Send the prompt and return the raw text reply.
    fn generate(&self, prompt: &str) -> Result<String, TransportError>;
}

impl<T: ModelClient + ?Sized> ModelClient for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        (**self).generate(prompt)
    }
}

/// Build the client selected by the config.
pub fn from_config(config: &ModelConfig) -> Result<Box<dyn ModelClient>, TransportError> {
    match config.transport {
        Transport::Api => Ok(Box::new(GeminiApiClient::from_env(config)?)),
        Transport::Cli => Ok(Box::new(GeminiCliClient::from_config(config)?)),
    }
}

/// First `n` chars of a response body, for error messages.
fn body_excerpt(body: &str, n: usize) -> String {
    crate::payload::truncate_chars(body.trim(), n).to_string()
}

/// Non-empty, trimmed environment variable.
fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
