//! Error taxonomy for detection runs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Extracted text is too short to analyze
    #[error("Insufficient content for analysis ({length} characters, need {minimum})")]
    InsufficientContent { length: usize, minimum: usize },

    /// Remote provider selected without an API key
    #[error("No API key provided in settings")]
    MissingApiKey,

    /// Transport-level failure reaching the model endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// 5xx from the model endpoint
    #[error("Upstream server error {status}: {message}")]
    UpstreamServer { status: u16, message: String },

    /// 4xx from the model endpoint, e.g. an invalid key
    #[error("Upstream client error {status}: {message}")]
    UpstreamClient { status: u16, message: String },

    /// Reply had no usable JSON, even after truncation recovery
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// No in-memory or persisted analysis for this page yet
    #[error("No analysis results found for this page")]
    NoAnalysisAvailable,
}

impl AnalysisError {
    /// Map an HTTP status and body message onto the taxonomy
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (500..600).contains(&status) {
            AnalysisError::UpstreamServer { status, message }
        } else {
            AnalysisError::UpstreamClient { status, message }
        }
    }

    /// Only transport failures and server-side errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Network(_) | AnalysisError::UpstreamServer { .. }
        )
    }
}
