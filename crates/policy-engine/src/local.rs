//! Pattern-based detector over extracted policy text
//!
//! Deterministic and offline. Every match of every rule becomes an issue, in
//! rule order then match order, with no deduplication.

use crate::error::AnalysisError;
use crate::patterns::{extract_context, first_occurrence};
use crate::rules::{Rule, RULES};
use shared_types::{AnalysisResult, IssueRecord, Severity};

/// Inputs shorter than this many characters are rejected before detection
pub const MIN_CONTENT_CHARS: usize = 100;

/// Reject text too short to be a policy
pub fn ensure_sufficient_content(text: &str) -> Result<(), AnalysisError> {
    let length = text.chars().count();
    if length < MIN_CONTENT_CHARS {
        return Err(AnalysisError::InsufficientContent {
            length,
            minimum: MIN_CONTENT_CHARS,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDetector;

impl LocalDetector {
    pub fn new() -> Self {
        Self
    }

    /// Full analysis: issues, summary and recommendations
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        ensure_sufficient_content(text)?;

        let issues = self.detect_issues(text);
        let summary = format!(
            "Analyzed {} characters. Found {} potential concerns.",
            text.chars().count(),
            issues.len()
        );
        let recommendations = generate_recommendations(&issues);

        Ok(AnalysisResult {
            issues,
            summary,
            recommendations,
        })
    }

    /// Run every rule over `text`.
    ///
    /// The reported position is the first occurrence of the matched substring,
    /// so repeated identical matches all report the same offset.
    pub fn detect_issues(&self, text: &str) -> Vec<IssueRecord> {
        let mut issues = Vec::new();

        for rule in RULES.iter() {
            for found in rule.pattern.find_iter(text) {
                let matched = found.as_str();
                let position = first_occurrence(text, matched).unwrap_or(0);
                let context = extract_context(text, position, matched.chars().count());
                issues.push(issue_from_rule(rule, matched, context, position));
            }
        }

        tracing::debug!(issues = issues.len(), "local detection finished");
        issues
    }
}

fn issue_from_rule(rule: &Rule, matched: &str, context: String, position: usize) -> IssueRecord {
    IssueRecord {
        id: rule.id.to_string(),
        severity: rule.severity,
        category: rule.category.to_string(),
        title: rule.title.to_string(),
        description: rule.description.to_string(),
        legal_suggestion: rule.legal_suggestion.to_string(),
        matched_text: matched.to_string(),
        context,
        position: Some(position),
    }
}

/// Advice lines shown under the issue list
pub fn generate_recommendations(issues: &[IssueRecord]) -> Vec<String> {
    if issues.is_empty() {
        return vec![
            "This privacy policy appears to have reasonable terms for user privacy.".to_string(),
        ];
    }

    let mut recommendations =
        vec!["Consider the following concerns before using this service:".to_string()];

    let high_count = issues
        .iter()
        .filter(|issue| issue.severity == Severity::High)
        .count();
    if high_count > 0 {
        recommendations.push(format!(
            "• {} high-priority privacy concerns identified",
            high_count
        ));
    }

    let mut categories: Vec<&str> = Vec::new();
    for issue in issues {
        if !categories.contains(&issue.category.as_str()) {
            categories.push(&issue.category);
        }
    }
    recommendations.push(format!("• Issues found in: {}", categories.join(", ")));
    recommendations.push("• Review each highlighted section carefully".to_string());
    recommendations.push("• Consider contacting the service provider for clarification".to_string());

    recommendations
}
