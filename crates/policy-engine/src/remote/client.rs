//! Gemini `generateContent` client.

use crate::error::AnalysisError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried, in order, when validating a key
pub const PROBE_MODELS: [&str; 3] = ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

const PROBE_PROMPT: &str = "Hello, this is a test message.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    pub fn single_prompt(prompt: &str, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|part| part.text.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Single-shot text completion. One call is one HTTP round trip; retries
/// live in the caller.
#[async_trait(?Send)]
pub trait CompletionClient {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AnalysisError> {
        Ok(Self {
            http: build_http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_http_client() -> Result<Client, AnalysisError> {
    Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .map_err(|e| AnalysisError::Network(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn build_http_client() -> Result<Client, AnalysisError> {
    Client::builder()
        .build()
        .map_err(|e| AnalysisError::Network(e.to_string()))
}

#[async_trait(?Send)]
impl CompletionClient for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(model, "gemini generateContent");

        let response = self
            .http
            .post(&url)
            .header("X-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<GeminiError>(&body) {
                Ok(e) => e.error.message,
                Err(_) => format!("HTTP {}", status.as_u16()),
            };
            return Err(AnalysisError::from_status(status.as_u16(), message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            AnalysisError::MalformedResponse(format!("Failed to parse response: {}", e))
        })?;

        parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| AnalysisError::MalformedResponse("Invalid response from Gemini API".into()))
    }
}

/// Try [`PROBE_MODELS`] in order and report the first model that answers.
/// When every model fails, the last model's error is returned.
pub async fn probe_api_key(
    client: &dyn CompletionClient,
    api_key: &str,
) -> Result<&'static str, AnalysisError> {
    if api_key.trim().is_empty() {
        return Err(AnalysisError::MissingApiKey);
    }

    let request = GenerateContentRequest::single_prompt(
        PROBE_PROMPT,
        GenerationConfig {
            temperature: 0.1,
            top_k: None,
            top_p: None,
            max_output_tokens: 50,
        },
    );

    let mut last_error = AnalysisError::MissingApiKey;
    for model in PROBE_MODELS {
        match client.generate(api_key, model, &request).await {
            Ok(_) => {
                tracing::info!(model, "api key accepted");
                return Ok(model);
            }
            Err(err) => {
                debug!(model, %err, "api key probe failed");
                last_error = err;
            }
        }
    }
    Err(last_error)
}
