//! OpenAI image generation for collage scenes.
//!
//! POST {api_base}/images/generations with `response_format: b64_json`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{body_excerpt, non_empty_env, TransportError};
use crate::analysis::VisionScene;

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Concurrent image requests.
const MAX_IN_FLIGHT: usize = 4;

/// A generated image and the theme it illustrates.
pub struct SceneImage {
    pub theme: String,
    pub image: DynamicImage,
}

/// Client for the OpenAI images endpoint.
pub struct OpenAiImageClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
    size: String,
    timeout: Duration,
}

impl OpenAiImageClient {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(concat!("visionboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            size: "1024x1024".to_string(),
            timeout: Duration::from_secs(60),
        })
    }

    /// Create a client from `OPENAI_API_KEY`, honoring `OPENAI_API_BASE`.
    pub fn from_env(model: impl Into<String>) -> Result<Self, TransportError> {
        let key = non_empty_env("OPENAI_API_KEY").ok_or(TransportError::MissingApiKey("OPENAI_API_KEY"))?;
        let mut client = Self::new(model, key)?;
        if let Some(base) = non_empty_env("OPENAI_API_BASE") {
            client = client.api_base(base);
        }
        Ok(client)
    }

    /// Override the API base URL.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Generate images for up to `max` scenes.
    ///
    /// Scenes that fail are logged and skipped; the result keeps scene order.
    pub fn generate_scenes(&self, scenes: &[VisionScene], max: usize) -> Result<Vec<SceneImage>, TransportError> {
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(runtime.block_on(self.generate_all(scenes, max)))
    }

    async fn generate_all(&self, scenes: &[VisionScene], max: usize) -> Vec<SceneImage> {
        let results: Vec<_> = stream::iter(scenes.iter().take(max).enumerate())
            .map(|(i, scene)| async move {
                info!(scene = i + 1, theme = %scene.theme, "generating scene image");
                (scene, self.generate_image(&scene.image_description).await)
            })
            .buffered(MAX_IN_FLIGHT)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(scene, result)| match result {
                Ok(image) => Some(SceneImage {
                    theme: scene.theme.clone(),
                    image,
                }),
                Err(e) => {
                    warn!(theme = %scene.theme, error = %e, "scene image failed");
                    None
                }
            })
            .collect()
    }

    async fn generate_image(&self, description: &str) -> Result<DynamicImage, TransportError> {
        let body = json!({
            "model": self.model,
            "prompt": scene_prompt(description),
            "n": 1,
            "size": self.size,
            "response_format": "b64_json",
        });

        let response = self
            .http
            .post(format!("{}/images/generations", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
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
        let text = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                body: body_excerpt(&text, 500),
            });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| TransportError::UnexpectedResponse(e.to_string()))?;
        let encoded = value
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("b64_json"))
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::UnexpectedResponse("missing data[0].b64_json".to_string()))?;

        decode_image(encoded)
    }
}

fn scene_prompt(description: &str) -> String {
    format!(
        "Create a high-quality, inspirational vision board image that visualizes success and achievement. \
         The image should be photorealistic and motivational, showing: {}\n\n\
         Style: Professional, aspirational, bright lighting, successful atmosphere, high quality photography style. \
         Avoid text overlays - focus on pure visual storytelling.",
        description.trim()
    )
}

fn decode_image(encoded: &str) -> Result<DynamicImage, TransportError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| TransportError::UnexpectedResponse(format!("invalid base64 image: {}", e)))?;
    debug!(bytes = bytes.len(), "decoded scene image");
    image::load_from_memory(&bytes)
        .map_err(|e| TransportError::UnexpectedResponse(format!("undecodable image: {}", e)))
}
