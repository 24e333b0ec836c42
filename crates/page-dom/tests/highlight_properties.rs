use page_dom::{highlight_snippet, remove_highlights, Document, HighlightOutcome, MatchTier};
use proptest::prelude::*;
use proptest::sample::Index;

fn paragraphs() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-z]{1,8}", 1..12), 1..5)
}

fn page(paragraphs: &[Vec<String>]) -> Document {
    let body: String = paragraphs
        .iter()
        .map(|words| format!("<p style=\"color: gray\">{}</p>", words.join(" ")))
        .collect();
    Document::parse(&format!("<html><head></head><body>{}</body></html>", body))
}

proptest! {
    #[test]
    fn wrap_then_remove_restores_markup(
        paras in paragraphs(),
        which in any::<Index>(),
        from in any::<Index>(),
        span in any::<Index>(),
    ) {
        let words = which.get(&paras);
        let start = from.index(words.len());
        let end = start + 1 + span.index(words.len() - start);
        let snippet = words[start..end].join(" ");

        let mut doc = page(&paras);
        let before = doc.outer_html(doc.root());

        let outcome = highlight_snippet(&mut doc, &snippet);
        prop_assert_eq!(outcome, HighlightOutcome::Wrapped(MatchTier::Exact));

        prop_assert_eq!(remove_highlights(&mut doc), 1);
        prop_assert_eq!(doc.outer_html(doc.root()), before);
    }

    #[test]
    fn removal_twice_matches_removal_once(paras in paragraphs(), snippet in "[a-z ]{0,30}") {
        let mut doc = page(&paras);
        highlight_snippet(&mut doc, &snippet);

        remove_highlights(&mut doc);
        let once = doc.outer_html(doc.root());
        prop_assert_eq!(remove_highlights(&mut doc), 0);
        prop_assert_eq!(doc.outer_html(doc.root()), once);
    }
}
