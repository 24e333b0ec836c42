//! Remote detection through a hosted language model
//!
//! One request per analysis: the prompt carries the first
//! [`RemoteConfig::max_input_chars`] characters of the policy, the reply is
//! parsed by [`response::parse_model_reply`] and positions are resolved against
//! the full text.

pub mod client;
pub mod prompt;
pub mod response;
pub mod retry;

use crate::error::AnalysisError;
use client::{CompletionClient, GenerateContentRequest, GenerationConfig};
use retry::{Backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use shared_types::AnalysisResult;

pub use client::{probe_api_key, GeminiClient, DEFAULT_BASE_URL, PROBE_MODELS};
pub use response::parse_model_reply;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub model: String,
    /// Policy text beyond this many characters is not sent
    pub max_input_chars: usize,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub retry: RetryPolicy,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gemini-2.0-flash".to_string(),
            max_input_chars: 8000,
            temperature: 0.3,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
            retry: RetryPolicy::default(),
        }
    }
}

impl RemoteConfig {
    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_k: Some(self.top_k),
            top_p: Some(self.top_p),
            max_output_tokens: self.max_output_tokens,
        }
    }
}

pub struct RemoteDetector {
    client: Box<dyn CompletionClient>,
    backoff: Box<dyn Backoff>,
    config: RemoteConfig,
}

impl RemoteDetector {
    pub fn new(
        client: Box<dyn CompletionClient>,
        backoff: Box<dyn Backoff>,
        config: RemoteConfig,
    ) -> Self {
        Self {
            client,
            backoff,
            config,
        }
    }

    /// Detector talking to the real endpoint at `config.base_url`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn gemini(config: RemoteConfig) -> Result<Self, AnalysisError> {
        let client = GeminiClient::new(config.base_url.clone())?;
        Ok(Self::new(
            Box::new(client),
            Box::new(retry::TokioBackoff),
            config,
        ))
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Analyze `text` with the model. Transport and 5xx failures are retried
    /// per the configured policy; anything else is returned as is.
    pub async fn analyze(&self, text: &str, api_key: &str) -> Result<AnalysisResult, AnalysisError> {
        if api_key.trim().is_empty() {
            return Err(AnalysisError::MissingApiKey);
        }

        let prompt = prompt::build_prompt(text, self.config.max_input_chars);
        let request = GenerateContentRequest::single_prompt(&prompt, self.config.generation_config());
        let request = &request;

        let reply = self
            .config
            .retry
            .run(self.backoff.as_ref(), move |attempt| {
                tracing::debug!(attempt, model = %self.config.model, "sending analysis request");
                self.client.generate(api_key, &self.config.model, request)
            })
            .await?;

        parse_model_reply(&reply, text)
    }
}

impl std::fmt::Debug for RemoteDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDetector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
