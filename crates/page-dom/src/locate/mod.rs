//! In-page text locator and highlighter
//!
//! Finds the live text node that best matches an issue's snippet, wraps the
//! matched range in a marker span and scrolls it into view. At most one
//! marker exists at a time: every highlight starts by removing the previous
//! ones.

pub mod tiers;

use crate::tree::{DomTree, MarkerSpec, StyleRule};
use shared_types::IssueRecord;
pub use tiers::{find_best_match, normalize, MatchTier, TextMatch};

/// Root id of the results panel; its text is never searched
pub const PANEL_ROOT_ID: &str = "privacy-analysis-panel";

pub const HIGHLIGHT_CLASS: &str = "privacy-highlight";
pub const PARENT_HIGHLIGHT_CLASS: &str = "privacy-highlight-parent";

/// Subtrees skipped when collecting text nodes
const SKIPPED_TAGS: &[&str] = &["script", "style"];

const fn important(property: &'static str, value: &'static str) -> StyleRule {
    StyleRule {
        property,
        value,
        important: true,
    }
}

pub const HIGHLIGHT_STYLE: &[StyleRule] = &[
    important("background-color", "#ffeb3b"),
    important("padding", "2px 4px"),
    important("border-radius", "3px"),
    important("box-shadow", "0 0 8px rgba(255, 235, 59, 0.6)"),
    important("position", "relative"),
    important("animation", "highlightPulse 2s ease-in-out"),
    important("z-index", "1000"),
];

pub const PARENT_HIGHLIGHT_STYLE: &[StyleRule] = &[
    important("background-color", "#ffeb3b"),
    important("padding", "4px"),
    important("border-radius", "4px"),
    important("box-shadow", "0 0 8px rgba(255, 235, 59, 0.6)"),
    important("position", "relative"),
    important("z-index", "1000"),
];

pub const HIGHLIGHT_MARKER: MarkerSpec = MarkerSpec {
    tag: "span",
    class: HIGHLIGHT_CLASS,
    style: HIGHLIGHT_STYLE,
};

/// How a highlight request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightOutcome {
    /// The matched range is wrapped in a marker span
    Wrapped(MatchTier),
    /// Wrapping failed; the text's parent element carries the marker styling
    ParentStyled(MatchTier),
    /// Nothing could be styled but the match was scrolled into view
    ScrolledOnly(MatchTier),
    NotFound,
}

impl HighlightOutcome {
    /// Whether the request counts as a success
    pub fn placed(&self) -> bool {
        !matches!(self, HighlightOutcome::NotFound)
    }

    pub fn tier(&self) -> Option<MatchTier> {
        match self {
            HighlightOutcome::Wrapped(tier)
            | HighlightOutcome::ParentStyled(tier)
            | HighlightOutcome::ScrolledOnly(tier) => Some(*tier),
            HighlightOutcome::NotFound => None,
        }
    }
}

fn is_skipped<T: DomTree>(tree: &T, node: &T::Node) -> bool {
    match tree.tag_name(node) {
        Some(tag) if SKIPPED_TAGS.contains(&tag.as_str()) => true,
        Some(_) => tree.attribute(node, "id").as_deref() == Some(PANEL_ROOT_ID),
        None => false,
    }
}

/// Text nodes under the body in document order, skipping script and style
/// content and the results panel.
pub fn collect_text_nodes<T: DomTree>(tree: &T) -> Vec<(T::Node, String)> {
    let mut out = Vec::new();
    let Some(body) = tree.body() else {
        return out;
    };

    let mut stack: Vec<T::Node> = tree.children(&body).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if let Some(text) = tree.text(&node) {
            out.push((node, text));
        } else if !is_skipped(tree, &node) {
            stack.extend(tree.children(&node).into_iter().rev());
        }
    }
    out
}

/// Characters to mark starting at `offset` in a node of `node_len` characters
fn highlight_len(snippet_len: usize, tier: MatchTier, offset: usize, node_len: usize) -> usize {
    let wanted = match tier {
        MatchTier::Fuzzy => snippet_len * 3 / 2,
        MatchTier::Exact | MatchTier::Prefix => snippet_len,
    };
    wanted.min(node_len.saturating_sub(offset))
}

/// Highlight the snippet of one issue
pub fn highlight_issue<T: DomTree>(tree: &mut T, issue: &IssueRecord) -> HighlightOutcome {
    highlight_snippet(tree, &issue.matched_text)
}

/// Remove existing markers, locate `snippet` and mark it.
///
/// Never fails: a snippet that cannot be located reports
/// [`HighlightOutcome::NotFound`] and leaves the page untouched.
pub fn highlight_snippet<T: DomTree>(tree: &mut T, snippet: &str) -> HighlightOutcome {
    remove_highlights(tree);

    let candidates = collect_text_nodes(tree);
    let texts: Vec<&str> = candidates.iter().map(|(_, text)| text.as_str()).collect();
    let Some(found) = find_best_match(snippet, &texts) else {
        tracing::warn!(candidates = candidates.len(), "could not find text to highlight on page");
        return HighlightOutcome::NotFound;
    };

    let (node, text) = &candidates[found.candidate];
    let node_len = text.chars().count();
    let offset = found.offset.min(node_len);
    let len = highlight_len(snippet.chars().count(), found.tier, offset, node_len);
    tracing::debug!(tier = ?found.tier, offset, len, "located snippet");

    let wrap_error = match tree.wrap_text(node, offset, len, &HIGHLIGHT_MARKER) {
        Ok(marker) => {
            if let Err(err) = tree.scroll_into_view(&marker) {
                tracing::debug!(%err, "scrolling to marker failed");
            }
            return HighlightOutcome::Wrapped(found.tier);
        }
        Err(err) => err,
    };
    tracing::warn!(%wrap_error, "wrapping match failed, styling parent element");

    let Some(parent) = tree.parent_element(node) else {
        tracing::warn!("matched text has no parent element, scrolling only");
        scroll_fallback(tree, node);
        return HighlightOutcome::ScrolledOnly(found.tier);
    };

    match style_parent(tree, &parent) {
        Ok(()) => {
            if let Err(err) = tree.scroll_into_view(&parent) {
                tracing::debug!(%err, "scrolling to parent failed");
            }
            HighlightOutcome::ParentStyled(found.tier)
        }
        Err(err) => {
            tracing::warn!(%err, "parent highlighting failed, scrolling only");
            clear_parent_marker(tree, &parent);
            scroll_fallback(tree, &parent);
            HighlightOutcome::ScrolledOnly(found.tier)
        }
    }
}

/// Last resort once a match exists: the request still succeeds even when
/// the scroll itself is refused.
fn scroll_fallback<T: DomTree>(tree: &mut T, node: &T::Node) {
    if let Err(err) = tree.scroll_into_view(node) {
        tracing::warn!(%err, "fallback scroll failed");
    }
}

fn style_parent<T: DomTree>(tree: &mut T, element: &T::Node) -> Result<(), crate::DomError> {
    for rule in PARENT_HIGHLIGHT_STYLE {
        tree.set_style(element, rule)?;
    }
    tree.add_class(element, PARENT_HIGHLIGHT_CLASS)
}

/// Strip the marker styling from one element. Other inline styles stay.
fn clear_parent_marker<T: DomTree>(tree: &mut T, element: &T::Node) {
    for rule in PARENT_HIGHLIGHT_STYLE {
        if let Err(err) = tree.remove_style(element, rule.property) {
            tracing::debug!(%err, property = rule.property, "could not remove marker style");
        }
    }
    if let Err(err) = tree.remove_class(element, PARENT_HIGHLIGHT_CLASS) {
        tracing::debug!(%err, "could not remove marker class");
    }
    let style_left = tree
        .attribute(element, "style")
        .is_some_and(|style| !style.trim().is_empty());
    if !style_left {
        if let Err(err) = tree.remove_attribute(element, "style") {
            tracing::debug!(%err, "could not remove empty style attribute");
        }
    }
}

/// Remove every marker this module created. Returns how many were removed;
/// a second call in a row removes nothing.
pub fn remove_highlights<T: DomTree>(tree: &mut T) -> usize {
    let mut removed = 0;

    for marker in tree.elements_with_class(HIGHLIGHT_CLASS) {
        match tree.unwrap_marker(&marker) {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!(%err, "failed to remove highlight span"),
        }
    }

    for element in tree.elements_with_class(PARENT_HIGHLIGHT_CLASS) {
        clear_parent_marker(tree, &element);
        removed += 1;
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use pretty_assertions::assert_eq;

    fn page(body: &str) -> Document {
        Document::parse(&format!("<html><body>{}</body></html>", body))
    }

    fn body_html(doc: &Document) -> String {
        doc.inner_html(doc.body().unwrap())
    }

    #[test]
    fn test_collect_skips_script_style_and_panel() {
        let doc = page(
            r#"<p>visible</p><script>hidden()</script><style>p{}</style>
               <div id="privacy-analysis-panel"><p>panel text</p></div><p>tail</p>"#,
        );
        let texts: Vec<String> = collect_text_nodes(&doc)
            .into_iter()
            .map(|(_, text)| text)
            .filter(|text| !text.trim().is_empty())
            .collect();
        assert_eq!(texts, vec!["visible", "tail"]);
    }

    #[test]
    fn test_tier_one_with_irregular_spacing() {
        let mut doc = page("<p>We may share your  Personal   Information with partners.</p>");

        let outcome = highlight_snippet(&mut doc, "personal information");

        assert_eq!(outcome, HighlightOutcome::Wrapped(MatchTier::Exact));
        let marker = doc.elements_with_class(HIGHLIGHT_CLASS)[0];
        // offset from normalized text applied to the raw node text
        assert_eq!(doc.text_content(marker), " Personal   Informat");
        assert_eq!(doc.scrolled_to(), Some(marker));
    }

    #[test]
    fn test_exact_match_wraps_snippet() {
        let mut doc = page("<p>Intro.</p><p>We keep logs forever.</p>");

        let outcome = highlight_snippet(&mut doc, "keep logs forever");

        assert!(outcome.placed());
        assert_eq!(
            body_html(&doc),
            "<p>Intro.</p><p>We <span class=\"privacy-highlight\" style=\"background-color: #ffeb3b !important; \
             padding: 2px 4px !important; border-radius: 3px !important; \
             box-shadow: 0 0 8px rgba(255, 235, 59, 0.6) !important; position: relative !important; \
             animation: highlightPulse 2s ease-in-out !important; z-index: 1000 !important;\">keep logs forever</span>.</p>"
        );
    }

    #[test]
    fn test_fuzzy_length_is_clamped_to_node() {
        let mut doc = page("<p>retain records forever</p>");

        let outcome = highlight_snippet(&mut doc, "records forever retained");

        assert_eq!(outcome, HighlightOutcome::Wrapped(MatchTier::Fuzzy));
        let marker = doc.elements_with_class(HIGHLIGHT_CLASS)[0];
        assert_eq!(doc.text_content(marker), "retain records forever");
    }

    #[test]
    fn test_new_highlight_replaces_previous() {
        let mut doc = page("<p>We sell data.</p><p>We keep logs forever.</p>");
        highlight_snippet(&mut doc, "sell data");
        highlight_snippet(&mut doc, "logs forever");

        let markers = doc.elements_with_class(HIGHLIGHT_CLASS);
        assert_eq!(markers.len(), 1);
        assert_eq!(doc.text_content(markers[0]), "logs forever");
        let first = doc.find_element("p").unwrap();
        assert_eq!(doc.children(first).len(), 1);
    }

    #[test]
    fn test_not_found_leaves_page_untouched() {
        let mut doc = page("<p>Nothing relevant here.</p>");
        let before = body_html(&doc);

        let outcome = highlight_snippet(&mut doc, "biometric identifiers sold");

        assert_eq!(outcome, HighlightOutcome::NotFound);
        assert!(!outcome.placed());
        assert_eq!(body_html(&doc), before);
    }

    #[test]
    fn test_wrap_failure_falls_back_to_parent_styling() {
        let mut doc = page(r#"<textarea style="color: blue">we sell data</textarea>"#);

        let outcome = highlight_snippet(&mut doc, "sell data");

        assert_eq!(outcome, HighlightOutcome::ParentStyled(MatchTier::Exact));
        let textarea = doc.find_element("textarea").unwrap();
        assert!(doc.has_class(textarea, PARENT_HIGHLIGHT_CLASS));
        assert_eq!(doc.style_property(textarea, "padding").as_deref(), Some("4px"));
        assert_eq!(doc.scrolled_to(), Some(textarea));

        assert_eq!(remove_highlights(&mut doc), 1);
        assert_eq!(doc.attr(textarea, "style"), Some("color: blue;"));
        assert_eq!(doc.attr(textarea, "class"), None);
    }

    #[test]
    fn test_parent_cleanup_removes_empty_style_attribute() {
        let mut doc = page("<textarea>we sell data</textarea>");
        highlight_snippet(&mut doc, "sell data");
        remove_highlights(&mut doc);

        assert_eq!(body_html(&doc), "<textarea>we sell data</textarea>");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut doc = page("<p>We sell data.</p>");
        highlight_snippet(&mut doc, "sell");

        assert_eq!(remove_highlights(&mut doc), 1);
        let once = body_html(&doc);
        assert_eq!(remove_highlights(&mut doc), 0);
        assert_eq!(body_html(&doc), once);
        assert_eq!(once, "<p>We sell data.</p>");
    }
}
