//! Privacy-policy issue detection
//!
//! - [`local`]: regex rule table over extracted text, offline and deterministic
//! - [`remote`]: hosted model detector with bounded retry and truncated-reply recovery
//! - [`detector`]: the closed `{Local, Remote}` choice, remote falling back to local
//! - [`session`]: per-page analysis state, persistence and the analyzer registry

pub mod detector;
pub mod error;
pub mod local;
pub mod patterns;
pub mod remote;
pub mod rules;
pub mod session;
pub mod store;

pub use detector::{Detector, IssueDetector};
pub use error::AnalysisError;
pub use local::{generate_recommendations, LocalDetector, MIN_CONTENT_CHARS};
pub use remote::{RemoteConfig, RemoteDetector};
pub use session::{AnalysisOutcome, AnalyzerRegistry, NoProgress, PageAnalyzer, ProgressIndicator};
pub use store::{analysis_key, AnalysisStore, MemoryStore, StoreError};
