//! Page model for policy pages
//!
//! - [`dom`]: page document parsed and queried with `scraper`
//! - [`tree`]: the [`DomTree`] seam the locator runs against
//! - [`extract`] and [`detect`]: flatten a page to text and score it
//! - [`locate`]: find an issue's snippet on the page and mark it
//! - [`panel`]: the results panel model

pub mod detect;
pub mod dom;
pub mod error;
pub mod extract;
pub mod locate;
pub mod panel;
pub mod tree;

pub use detect::{is_privacy_related_url, quick_privacy_check, strict_privacy_check, PrivacyScore};
pub use dom::{Document, NodeId};
pub use error::DomError;
pub use extract::{extract_policy_text, ExtractOptions};
pub use locate::{highlight_issue, highlight_snippet, remove_highlights, HighlightOutcome, MatchTier};
pub use panel::IssuePanel;
pub use tree::{DomTree, MarkerSpec, StyleRule};
