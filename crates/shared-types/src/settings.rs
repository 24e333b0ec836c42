//! User settings consumed by detection and display
//!
//! Field names and defaults match what the options page persists, so a stored
//! settings blob deserializes directly into [`Settings`].

use crate::types::{IssueRecord, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiProvider {
    #[default]
    #[serde(rename = "built-in")]
    BuiltIn,
    #[serde(rename = "gemini")]
    Gemini,
}

/// Requested analysis depth.
///
/// Stored and forwarded, but the remote detector uses the same model for both
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    #[default]
    Standard,
    Detailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub ai_provider: AiProvider,
    pub api_key: String,
    pub analysis_depth: AnalysisDepth,
    pub auto_detect: bool,
    pub highlight_severity: Vec<Severity>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_provider: AiProvider::BuiltIn,
            api_key: String::new(),
            analysis_depth: AnalysisDepth::Standard,
            auto_detect: true,
            highlight_severity: vec![Severity::High, Severity::Medium],
        }
    }
}

impl Settings {
    /// True when the remote provider is selected and a key is configured
    pub fn wants_remote(&self) -> bool {
        self.ai_provider == AiProvider::Gemini && !self.api_key.trim().is_empty()
    }

    pub fn severity_filter(&self) -> SeverityFilter {
        SeverityFilter::from_labels(&self.highlight_severity)
    }
}

/// Set of severities eligible for display and highlighting.
///
/// An empty selection falls back to high and medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityFilter {
    selected: Vec<Severity>,
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self {
            selected: vec![Severity::High, Severity::Medium],
        }
    }
}

impl SeverityFilter {
    pub fn from_labels(labels: &[Severity]) -> Self {
        let mut selected = Vec::with_capacity(3);
        for severity in labels {
            if !selected.contains(severity) {
                selected.push(*severity);
            }
        }

        if selected.is_empty() {
            Self::default()
        } else {
            Self { selected }
        }
    }

    pub fn allows(&self, severity: Severity) -> bool {
        self.selected.contains(&severity)
    }

    pub fn is_all(&self) -> bool {
        Severity::ALL.iter().all(|s| self.selected.contains(s))
    }

    /// Slash-joined labels in selection order, e.g. `high/medium`
    pub fn label(&self) -> String {
        self.selected
            .iter()
            .map(Severity::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn apply(&self, issues: &[IssueRecord]) -> Vec<IssueRecord> {
        issues
            .iter()
            .filter(|issue| self.allows(issue.severity))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_options_page() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.ai_provider, AiProvider::BuiltIn);
        assert!(settings.auto_detect);
        assert!(!settings.wants_remote());
    }

    #[test]
    fn test_parses_stored_settings() {
        let json = r#"{
            "aiProvider": "gemini",
            "apiKey": "abc",
            "analysisDepth": "detailed",
            "highlightSeverity": ["low"]
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.ai_provider, AiProvider::Gemini);
        assert_eq!(settings.analysis_depth, AnalysisDepth::Detailed);
        assert!(settings.wants_remote());
        assert_eq!(settings.severity_filter().label(), "low");
    }

    #[test]
    fn test_gemini_without_key_stays_local() {
        let settings = Settings {
            ai_provider: AiProvider::Gemini,
            api_key: "   ".to_string(),
            ..Settings::default()
        };
        assert!(!settings.wants_remote());
    }

    #[test]
    fn test_empty_filter_defaults_to_high_and_medium() {
        let filter = SeverityFilter::from_labels(&[]);
        assert!(filter.allows(Severity::High));
        assert!(filter.allows(Severity::Medium));
        assert!(!filter.allows(Severity::Low));
        assert_eq!(filter.label(), "high/medium");
    }

    #[test]
    fn test_filter_dedups_and_detects_all() {
        let filter = SeverityFilter::from_labels(&[
            Severity::Low,
            Severity::High,
            Severity::Low,
            Severity::Medium,
        ]);
        assert!(filter.is_all());
        assert_eq!(filter.label(), "low/high/medium");
    }
}
