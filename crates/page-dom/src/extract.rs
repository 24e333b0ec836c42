//! Flatten a page into the plain text handed to the detectors

use crate::dom::Document;
use lazy_static::lazy_static;
use scraper::Selector;

/// Subtrees that never hold policy text
pub const REMOVED_SELECTORS: &str = "script, style, nav, header, footer, .sidebar, .advertisement";

/// Content areas in priority order; `body` always matches last
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    ".content",
    ".policy-content",
    ".privacy-policy",
    ".terms-content",
    "article",
    ".main-content",
    "body",
];

/// Minimum text length for the substantial-content variant
pub const SUBSTANTIAL_CHARS: usize = 500;

lazy_static! {
    static ref REMOVED: Selector = Selector::parse(REMOVED_SELECTORS).unwrap();
    static ref CONTENT_AREAS: Vec<(&'static str, Selector)> = CONTENT_SELECTORS
        .iter()
        .map(|&css| (css, Selector::parse(css).unwrap()))
        .collect();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// When set, a content area is only taken if its text is longer than
    /// this many characters. `None` takes the first area that matches.
    pub min_content_chars: Option<usize>,
}

impl ExtractOptions {
    pub fn first_match() -> Self {
        Self::default()
    }

    pub fn substantial() -> Self {
        Self {
            min_content_chars: Some(SUBSTANTIAL_CHARS),
        }
    }

    fn accepts(&self, text: &str) -> bool {
        match self.min_content_chars {
            Some(min) => text.chars().count() > min,
            None => true,
        }
    }
}

/// Visible policy text of `doc`, trimmed. The document itself is not touched.
///
/// An empty first match falls through to the whole body rather than to the
/// next content area.
pub fn extract_policy_text(doc: &Document, options: &ExtractOptions) -> String {
    let mut copy = doc.clone();
    for node in copy.select(&REMOVED) {
        copy.remove(node);
    }

    let chosen = CONTENT_AREAS.iter().find_map(|(css, selector)| {
        let area = copy.select_first(selector)?;
        let text = copy.rendered_text(area);
        options.accepts(&text).then_some((*css, text))
    });

    match chosen {
        Some((css, text)) if !text.trim().is_empty() => {
            tracing::debug!(selector = css, chars = text.chars().count(), "extracted content area");
            text.trim().to_string()
        }
        _ => {
            tracing::debug!("no content area qualified, using whole body");
            copy.body()
                .map(|body| copy.rendered_text(body).trim().to_string())
                .unwrap_or_default()
        }
    }
}
