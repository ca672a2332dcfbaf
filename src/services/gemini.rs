use crate::config::ModelConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model API key is not configured")]
    MissingCredential,

    #[error("could not reach model service: {0}")]
    Connection(String),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable model response: {0}")]
    MalformedResponse(String),
}

/// Base64 image data sent inline with the prompt
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub media_type: String,
    pub data: String,
}

/// A multimodal model that answers a text prompt about one image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn analyze_image(&self, prompt: &str, image: &InlineImage)
    -> Result<String, ModelError>;

    /// False when no credential is available; callers must not attempt a request.
    fn is_configured(&self) -> bool;
}

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model_name.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        // Low temperature keeps the JSON shape stable between calls
        Self {
            temperature: 0.1,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|p| p.text)
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn analyze_image(
        &self,
        prompt: &str,
        image: &InlineImage,
    ) -> Result<String, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingCredential)?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: &image.media_type,
                            data: &image.data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig::default(),
        };

        tracing::debug!(
            "Calling {} with {} ({} base64 chars)",
            self.model,
            image.media_type,
            image.data.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Connection(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ModelError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        parsed
            .into_text()
            .ok_or_else(|| ModelError::MalformedResponse("no candidate text".to_string()))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
