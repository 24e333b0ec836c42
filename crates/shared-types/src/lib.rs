pub mod settings;
pub mod types;

pub use settings::{AiProvider, AnalysisDepth, SeverityFilter, Settings};
pub use types::{
    issue_id_from_title, AnalysisResult, AnalysisStatus, IssueRecord, Severity, StoredAnalysis,
};
