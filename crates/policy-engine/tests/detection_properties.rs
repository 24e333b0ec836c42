//! Property tests over the local detector and the reply parser

use policy_engine::local::{LocalDetector, MIN_CONTENT_CHARS};
use policy_engine::remote::parse_model_reply;
use policy_engine::AnalysisError;
use proptest::prelude::*;

const TRIGGERS: [&str; 6] = [
    "we may share your personal information with third parties",
    "we retain your data indefinitely",
    "we track your browsing activity",
    "we may update this policy at our discretion",
    "we protect your data with reasonable safeguards",
    "your ability to delete your account may be limited",
];

proptest! {
    #[test]
    fn short_input_is_rejected(text in "\\PC{0,99}") {
        prop_assume!(text.chars().count() < MIN_CONTENT_CHARS);
        let err = LocalDetector::new().analyze(&text).unwrap_err();
        let is_insufficient = matches!(err, AnalysisError::InsufficientContent { .. });
        prop_assert!(is_insufficient);
    }

    #[test]
    fn context_contains_matched_text(
        prefix in "\\PC{0,300}",
        suffix in "\\PC{0,300}",
        trigger in 0usize..TRIGGERS.len(),
    ) {
        let text = format!("{}. {}. {}", prefix, TRIGGERS[trigger], suffix);
        let issues = LocalDetector::new().detect_issues(&text);

        prop_assert!(!issues.is_empty());
        for issue in issues {
            prop_assert!(
                issue.context.contains(&issue.matched_text),
                "context {:?} lacks {:?}",
                issue.context,
                issue.matched_text
            );
        }
    }

    #[test]
    fn reply_parsing_never_panics(reply in "\\PC{0,400}") {
        let _ = parse_model_reply(&reply, "source text");
    }

    #[test]
    fn truncated_replies_keep_complete_issues(cut in 0usize..40) {
        let complete = r#"{"issues": [{"id":"a","severity":"high","title":"A"}, {"id":"b","severity":"low","title":"B"}, {"id":"c","severity":"medium","title":"Third issue here"}], "summary": "s"}"#;
        let second_end = complete.find(r#"{"id":"c""#).unwrap();
        let truncated = &complete[..second_end + cut];

        let result = parse_model_reply(truncated, "text").unwrap();
        let ids: Vec<_> = result.issues.iter().map(|i| i.id.as_str()).collect();
        prop_assert_eq!(ids, vec!["a", "b"]);
    }
}
