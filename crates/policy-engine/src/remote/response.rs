//! Parsing of free-form model replies into an [`AnalysisResult`]
//!
//! Replies are expected to hold one JSON object, possibly wrapped in a
//! markdown code fence. Replies cut off by the output token cap usually end in
//! the middle of the `issues` array; those go through a recovery scan that
//! keeps every issue object completed before the cut.

use crate::error::AnalysisError;
use crate::patterns::{extract_context, first_occurrence_ignore_case};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{issue_id_from_title, AnalysisResult, IssueRecord, Severity};

const RECOVERED_RECOMMENDATIONS: [&str; 3] = [
    "Review the highlighted privacy concerns carefully",
    "Consider the privacy implications before using this service",
    "Contact the service provider for clarification on unclear policies",
];

/// Issue object as the model sends it, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawIssue {
    id: Option<String>,
    severity: Option<String>,
    category: Option<String>,
    title: Option<String>,
    description: Option<String>,
    legal_suggestion: Option<String>,
    matched_text: Option<String>,
    context: Option<String>,
}

/// Parse a model reply. `source_text` is the untruncated policy text, used to
/// position each issue's `matchedText`.
pub fn parse_model_reply(reply: &str, source_text: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_code_fences(reply);
    let json = extract_json_object(&cleaned).ok_or_else(|| {
        AnalysisError::MalformedResponse("No valid JSON found in model response".to_string())
    })?;

    match serde_json::from_str::<Value>(json) {
        Ok(value) => build_result(&value, source_text),
        Err(err) if is_truncated_array(&err) => {
            let recovered = recover_truncated_issues(json);
            if recovered.is_empty() {
                return Err(AnalysisError::MalformedResponse(err.to_string()));
            }
            tracing::info!(
                recovered = recovered.len(),
                "recovered issues from truncated model reply"
            );

            let issues = normalize_issues(&recovered, source_text);
            Ok(AnalysisResult {
                summary: format!(
                    "Recovered analysis from Gemini API. Found {} privacy concerns.",
                    issues.len()
                ),
                issues,
                recommendations: RECOVERED_RECOMMENDATIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
        }
        Err(err) => Err(AnalysisError::MalformedResponse(err.to_string())),
    }
}

/// Drop markdown code fence markers around the payload
pub fn strip_code_fences(reply: &str) -> String {
    let mut text = reply.replace("```json", "");
    let trimmed_len = text.trim_end().len();
    text.truncate(trimmed_len);
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped.to_string();
    }
    if let Some(stripped) = text.trim_start().strip_prefix("```") {
        text = stripped.to_string();
    }
    text
}

/// The parser rejected input that ended (or broke) right after an array element
fn is_truncated_array(err: &serde_json::Error) -> bool {
    let message = err.to_string();
    message.contains("EOF while parsing a list") || message.contains("expected `,` or `]`")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    Escaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanEvent {
    /// A top-level object opened
    ObjectStart,
    /// A top-level object closed
    ObjectEnd,
    /// `]` outside any object
    ArrayEnd,
    None,
}

/// Brace-depth tracker that ignores structural characters inside strings
#[derive(Debug)]
struct ObjectScanner {
    state: ScanState,
    depth: usize,
}

impl ObjectScanner {
    fn new() -> Self {
        Self {
            state: ScanState::Normal,
            depth: 0,
        }
    }

    fn feed(&mut self, ch: char) -> ScanEvent {
        match self.state {
            ScanState::Escaped => {
                self.state = ScanState::InString;
                ScanEvent::None
            }
            ScanState::InString => {
                match ch {
                    '\\' => self.state = ScanState::Escaped,
                    '"' => self.state = ScanState::Normal,
                    _ => {}
                }
                ScanEvent::None
            }
            ScanState::Normal => match ch {
                '"' => {
                    self.state = ScanState::InString;
                    ScanEvent::None
                }
                '{' => {
                    self.depth += 1;
                    if self.depth == 1 {
                        ScanEvent::ObjectStart
                    } else {
                        ScanEvent::None
                    }
                }
                '}' if self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        ScanEvent::ObjectEnd
                    } else {
                        ScanEvent::None
                    }
                }
                ']' if self.depth == 0 => ScanEvent::ArrayEnd,
                _ => ScanEvent::None,
            },
        }
    }
}

/// First top-level JSON object in `text`.
///
/// When the braces never balance the slice runs to the last `}` so a
/// truncated reply still reaches the parser and can be diagnosed.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut scanner = ObjectScanner::new();

    for (offset, ch) in text[start..].char_indices() {
        if scanner.feed(ch) == ScanEvent::ObjectEnd {
            return Some(&text[start..start + offset + 1]);
        }
    }

    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Byte offset just past the `[` that opens the `issues` array
fn issues_array_start(json: &str) -> Option<usize> {
    let key = json.find("\"issues\"")?;
    let rest = &json[key + "\"issues\"".len()..];
    let after_ws = rest.trim_start();
    let after_colon = after_ws.strip_prefix(':')?.trim_start();
    after_colon.strip_prefix('[')?;
    Some(json.len() - after_colon.len() + 1)
}

/// Every syntactically complete object in the `issues` array, stopping at the
/// array's end or the truncation point. Objects that fail to parse are skipped.
pub fn recover_truncated_issues(json: &str) -> Vec<Value> {
    let Some(array_start) = issues_array_start(json) else {
        return Vec::new();
    };

    let mut scanner = ObjectScanner::new();
    let mut object_start = None;
    let mut objects = Vec::new();

    for (offset, ch) in json[array_start..].char_indices() {
        let position = array_start + offset;
        match scanner.feed(ch) {
            ScanEvent::ObjectStart => object_start = Some(position),
            ScanEvent::ObjectEnd => {
                if let Some(start) = object_start.take() {
                    match serde_json::from_str::<Value>(&json[start..=position]) {
                        Ok(value) => objects.push(value),
                        Err(err) => {
                            tracing::debug!(%err, "skipping malformed issue object");
                        }
                    }
                }
            }
            ScanEvent::ArrayEnd => break,
            ScanEvent::None => {}
        }
    }

    objects
}

fn build_result(value: &Value, source_text: &str) -> Result<AnalysisResult, AnalysisError> {
    let issues = value
        .get("issues")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AnalysisError::MalformedResponse(
                "Invalid analysis structure: missing issues array".to_string(),
            )
        })?;

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let recommendations = value
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(AnalysisResult {
        issues: normalize_issues(issues, source_text),
        summary,
        recommendations,
    })
}

fn normalize_issues(values: &[Value], source_text: &str) -> Vec<IssueRecord> {
    values
        .iter()
        .filter_map(|value| match RawIssue::deserialize(value) {
            Ok(raw) => Some(normalize_issue(raw, source_text)),
            Err(err) => {
                tracing::warn!(%err, "dropping issue with unexpected shape");
                None
            }
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Fill every optional field so downstream code never branches on presence
fn normalize_issue(raw: RawIssue, source_text: &str) -> IssueRecord {
    let title = non_empty(raw.title).unwrap_or_else(|| "Privacy concern".to_string());
    let id = non_empty(raw.id).unwrap_or_else(|| issue_id_from_title(&title));
    let severity = raw
        .severity
        .as_deref()
        .and_then(Severity::parse_label)
        .unwrap_or(Severity::Low);
    let matched_text = raw.matched_text.unwrap_or_default();

    let position = (!matched_text.is_empty())
        .then(|| first_occurrence_ignore_case(source_text, &matched_text).unwrap_or(0));

    let context = match (non_empty(raw.context), position) {
        (Some(context), _) => context,
        (None, Some(position)) => {
            extract_context(source_text, position, matched_text.chars().count())
        }
        (None, None) => String::new(),
    };

    IssueRecord {
        id,
        severity,
        category: non_empty(raw.category).unwrap_or_else(|| "General".to_string()),
        title,
        description: raw.description.unwrap_or_default(),
        legal_suggestion: raw.legal_suggestion.unwrap_or_default(),
        matched_text,
        context,
        position,
    }
}
