use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Parse a severity label, ignoring case and surrounding whitespace
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected concern in a policy text.
///
/// `position` is a character offset into the extracted text. `None` means the
/// offset is unknown and the locator has to search for `matched_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub id: String,
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: String,
    pub legal_suggestion: String,
    pub matched_text: String,
    pub context: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_position"
    )]
    pub position: Option<usize>,
}

/// Accepts the `-1` sentinel used by older stored records as "unknown"
fn deserialize_position<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<i64> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| usize::try_from(value).ok()))
}

/// Stable issue id derived from a title: lowercase, with every run of
/// characters outside `[a-z0-9]` collapsed to a single `_`.
pub fn issue_id_from_title(title: &str) -> String {
    let mut id = String::with_capacity(title.len());
    let mut in_separator = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            id.push(ch);
            in_separator = false;
        } else if !in_separator {
            id.push('_');
            in_separator = true;
        }
    }

    id
}

/// Output of one detection run, issues in detection order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub issues: Vec<IssueRecord>,
    pub summary: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Completed,
    Error,
}

/// Analysis record persisted per page visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub status: AnalysisStatus,
    pub timestamp: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoredAnalysis {
    pub fn completed(result: AnalysisResult, url: &str, timestamp: i64) -> Self {
        Self {
            issues: result.issues,
            summary: result.summary,
            recommendations: result.recommendations,
            status: AnalysisStatus::Completed,
            timestamp,
            url: url.to_string(),
            error: None,
        }
    }

    pub fn failed(message: &str, url: &str, timestamp: i64) -> Self {
        Self {
            issues: Vec::new(),
            summary: String::new(),
            recommendations: Vec::new(),
            status: AnalysisStatus::Error,
            timestamp,
            url: url.to_string(),
            error: Some(message.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AnalysisStatus::Completed
    }

    /// The analysis payload, only for completed records
    pub fn to_result(&self) -> Option<AnalysisResult> {
        self.is_completed().then(|| AnalysisResult {
            issues: self.issues.clone(),
            summary: self.summary.clone(),
            recommendations: self.recommendations.clone(),
        })
    }
}
