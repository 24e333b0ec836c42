//! Heuristics for "is this page a privacy policy?"
//!
//! Both checks are read-only: they score the current document state and
//! never mutate it.

use crate::dom::Document;
use crate::extract::{extract_policy_text, ExtractOptions};

pub const PRIVACY_INDICATORS: &[&str] = &[
    "privacy policy",
    "personal data",
    "data collection",
    "cookies",
    "personal information",
    "data processing",
    "data protection",
    "privacy notice",
    "information we collect",
    "how we use",
    "third party",
    "data sharing",
    "your rights",
    "gdpr",
    "data subject rights",
    "opt out",
    "consent",
    "legitimate interest",
];

/// URL fragments that suggest a policy or legal page
pub const PRIVACY_URL_HINTS: &[&str] = &[
    "privacy",
    "policy",
    "terms",
    "legal",
    "cookies",
    "data-protection",
];

pub const STRICT_MIN_TEXT_CHARS: usize = 200;
pub const QUICK_THRESHOLD: usize = 3;
pub const STRICT_RAW_THRESHOLD: usize = 3;
pub const STRICT_THRESHOLD: usize = 4;

const URL_TITLE_BONUS: usize = 2;
const HEADING_BONUS: usize = 1;

const ALL_HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const TOP_HEADINGS: &[&str] = &["h1", "h2", "h3"];

/// Indicator evidence gathered from one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivacyScore {
    /// Distinct indicator terms present in the text
    pub indicators: usize,
    pub url_or_title: bool,
    pub heading: bool,
}

impl PrivacyScore {
    pub fn boosted(&self) -> usize {
        self.indicators
            + if self.url_or_title { URL_TITLE_BONUS } else { 0 }
            + if self.heading { HEADING_BONUS } else { 0 }
    }
}

/// Number of distinct indicator terms found, case-insensitively
pub fn count_indicators(text: &str) -> usize {
    let lower = text.to_lowercase();
    PRIVACY_INDICATORS
        .iter()
        .filter(|term| lower.contains(*term))
        .count()
}

fn mentions_policy(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("privacy") || lower.contains("policy")
}

fn score(doc: &Document, text: &str, headings: &[&str]) -> PrivacyScore {
    PrivacyScore {
        indicators: count_indicators(text),
        url_or_title: mentions_policy(doc.url()) || mentions_policy(&doc.title()),
        heading: doc
            .elements_by_tag(doc.root(), headings)
            .into_iter()
            .any(|h| mentions_policy(&doc.text_content(h))),
    }
}

/// Lightweight signal over the whole body text
pub fn quick_privacy_check(doc: &Document) -> bool {
    let text = doc
        .body()
        .map(|body| doc.text_content(body))
        .unwrap_or_default();
    let score = score(doc, &text, ALL_HEADINGS);
    tracing::debug!(?score, "quick privacy check");
    score.indicators >= QUICK_THRESHOLD
}

/// Gate for running a full analysis on the extracted policy text
pub fn strict_privacy_check(doc: &Document) -> bool {
    let text = extract_policy_text(doc, &ExtractOptions::first_match());
    if text.chars().count() < STRICT_MIN_TEXT_CHARS {
        return false;
    }
    let score = score(doc, &text, TOP_HEADINGS);
    tracing::debug!(?score, boosted = score.boosted(), "strict privacy check");
    score.indicators >= STRICT_RAW_THRESHOLD && score.boosted() >= STRICT_THRESHOLD
}

pub fn is_privacy_related_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    PRIVACY_URL_HINTS.iter().any(|hint| lower.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILLER: &str = "This section explains the terms that apply when you visit the site and \
        read its pages, including how long content is kept available and which contact address \
        handles questions about it from members of the public.";

    fn policy_page(url: &str, heading: &str, body: &str) -> Document {
        let html = format!(
            "<html><head><title>Site</title></head><body><h2>{}</h2><p>{}</p><p>{}</p></body></html>",
            heading, body, FILLER
        );
        Document::parse_with_url(&html, url)
    }

    #[test]
    fn test_count_indicators_counts_distinct_terms() {
        assert_eq!(count_indicators("COOKIES, cookies and more cookies"), 1);
        assert_eq!(count_indicators("GDPR consent to Personal Data use"), 3);
        assert_eq!(count_indicators(""), 0);
    }

    #[test]
    fn test_quick_check_uses_raw_count() {
        let doc = Document::parse("<body><p>cookies, consent and your rights</p></body>");
        assert!(quick_privacy_check(&doc));

        let doc = Document::parse_with_url(
            "<body><h1>Privacy</h1><p>cookies and consent</p></body>",
            "https://example.com/privacy",
        );
        assert!(!quick_privacy_check(&doc));
    }

    #[test]
    fn test_strict_check_needs_boost() {
        let body = "We use cookies with your consent and respect your rights.";

        let plain = policy_page("https://example.com/about", "About", body);
        assert!(!strict_privacy_check(&plain));

        let by_url = policy_page("https://example.com/privacy", "About", body);
        assert!(strict_privacy_check(&by_url));

        let by_heading = policy_page("https://example.com/about", "Our Policy", body);
        assert!(strict_privacy_check(&by_heading));

        let low_heading = by_heading.outer_html(by_heading.root()).replace("h2>", "h4>");
        let low_heading = Document::parse_with_url(&low_heading, "https://example.com/about");
        assert!(!strict_privacy_check(&low_heading));
    }

    #[test]
    fn test_strict_check_raw_floor() {
        let doc = policy_page(
            "https://example.com/privacy-policy",
            "Privacy Policy",
            "We only use cookies.",
        );
        assert!(!strict_privacy_check(&doc));
    }

    #[test]
    fn test_strict_check_rejects_short_text() {
        let doc = Document::parse_with_url(
            "<body><h1>Privacy Policy</h1><p>cookies, consent, gdpr, opt out</p></body>",
            "https://example.com/privacy",
        );
        assert!(!strict_privacy_check(&doc));
    }

    #[test]
    fn test_privacy_related_url() {
        assert!(is_privacy_related_url("https://example.com/Legal/Terms"));
        assert!(is_privacy_related_url("https://example.com/data-protection"));
        assert!(!is_privacy_related_url("https://example.com/blog/post-1"));
    }
}
