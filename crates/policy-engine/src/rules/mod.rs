//! Built-in rule table for the local detector
//!
//! Rules run in table order. Each pattern is case-insensitive and `.` does not
//! cross line breaks, so a match never spans two paragraphs of extracted text.

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::Severity;

/// A single detection rule with the metadata copied onto every issue it yields
#[derive(Debug)]
pub struct Rule {
    pub id: &'static str,
    pub pattern: Regex,
    pub severity: Severity,
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub legal_suggestion: &'static str,
}

lazy_static! {
    pub static ref RULES: Vec<Rule> = vec![
        Rule {
            id: "data_sharing_third_party",
            pattern: Regex::new(
                r"(?i)(share|sell|transfer|provide).{0,50}(personal|data|information).{0,50}(third.part(?:y|ies)|partner|affiliate|vendor)"
            )
            .unwrap(),
            severity: Severity::High,
            category: "Data Sharing",
            title: "Third-Party Data Sharing",
            description: "Your data may be shared with third parties",
            legal_suggestion: "Review what specific data is shared and with whom. Consider if this is necessary for the service.",
        },
        Rule {
            id: "data_retention_long",
            pattern: Regex::new(r"(?i)(retain|keep|store).{0,30}(indefinitely|permanently|forever|long.term)").unwrap(),
            severity: Severity::High,
            category: "Data Retention",
            title: "Indefinite Data Retention",
            description: "Data may be kept indefinitely",
            legal_suggestion: "Request specific retention periods. Data should only be kept as long as necessary.",
        },
        Rule {
            id: "tracking_extensive",
            pattern: Regex::new(r"(?i)(track|monitor|collect).{0,50}(behavior|activity|browsing|location)").unwrap(),
            severity: Severity::Medium,
            category: "Tracking",
            title: "Extensive Tracking",
            description: "Comprehensive tracking of your activities",
            legal_suggestion: "Understand what tracking is essential vs. optional. Look for opt-out options.",
        },
        Rule {
            id: "policy_changes_unilateral",
            pattern: Regex::new(r"(?i)(change|modify|update).{0,30}(policy|terms).{0,50}(notice|notification|discretion)").unwrap(),
            severity: Severity::Medium,
            category: "Policy Changes",
            title: "Unilateral Policy Changes",
            description: "Policy can be changed without your consent",
            legal_suggestion: "Look for guarantees of notice before changes and your right to object.",
        },
        Rule {
            id: "data_security_vague",
            pattern: Regex::new(r"(?i)(security|protect).{0,30}(reasonable|appropriate|industry.standard)").unwrap(),
            severity: Severity::Medium,
            category: "Security",
            title: "Vague Security Measures",
            description: "Security measures are not clearly defined",
            legal_suggestion: "Request specific information about encryption and security standards used.",
        },
        Rule {
            id: "user_rights_limited",
            pattern: Regex::new(r"(?i)(delete|access|control|portability).{0,50}(limited|restricted|may.not|cannot)").unwrap(),
            severity: Severity::High,
            category: "User Rights",
            title: "Limited User Rights",
            description: "Your rights to control your data are restricted",
            legal_suggestion: "Verify this complies with local privacy laws (GDPR, CCPA, etc.)",
        },
    ];
}

pub fn rule_by_id(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.id == id)
}
