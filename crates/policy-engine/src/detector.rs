//! Detector selection and fallback
//!
//! A run is either local or remote, decided once from the settings. A remote
//! run that fails for any reason is logged and answered by the local detector.

use crate::error::AnalysisError;
use crate::local::{ensure_sufficient_content, LocalDetector};
use crate::remote::RemoteDetector;
use async_trait::async_trait;
use shared_types::{AnalysisResult, Settings};

/// Anything that turns extracted text into an analysis
#[async_trait(?Send)]
pub trait IssueDetector {
    async fn detect(&self, text: &str, settings: &Settings) -> Result<AnalysisResult, AnalysisError>;
}

#[derive(Debug)]
pub enum Detector {
    Local(LocalDetector),
    Remote {
        remote: RemoteDetector,
        fallback: LocalDetector,
    },
}

impl Detector {
    pub fn local() -> Self {
        Detector::Local(LocalDetector::new())
    }

    pub fn remote(remote: RemoteDetector) -> Self {
        Detector::Remote {
            remote,
            fallback: LocalDetector::new(),
        }
    }

    /// Pick the variant for one run. Without a remote detector, or when the
    /// settings do not ask for one, the run is local.
    pub fn select(settings: &Settings, remote: Option<RemoteDetector>) -> Self {
        match remote {
            Some(remote) if settings.wants_remote() => Detector::remote(remote),
            _ => Detector::local(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Detector::Remote { .. })
    }
}

#[async_trait(?Send)]
impl IssueDetector for Detector {
    async fn detect(&self, text: &str, settings: &Settings) -> Result<AnalysisResult, AnalysisError> {
        ensure_sufficient_content(text)?;

        match self {
            Detector::Local(local) => local.analyze(text),
            Detector::Remote { remote, fallback } => {
                match remote.analyze(text, &settings.api_key).await {
                    Ok(result) => {
                        tracing::info!(issues = result.issues.len(), "remote analysis finished");
                        Ok(result)
                    }
                    Err(err) => {
                        tracing::warn!(%err, "remote analysis failed, falling back to local detector");
                        fallback.analyze(text)
                    }
                }
            }
        }
    }
}
