use shared_types::{AnalysisResult, IssueRecord};

pub const CARD_CLASS: &str = "issue-item";
pub const CARD_INDEX_ATTR: &str = "data-issue-index";
pub const CLOSE_BUTTON_CLASS: &str = "panel-close-btn";

#[derive(Debug, Clone, PartialEq)]
pub struct IssueCard {
    pub index: usize,
    pub issue: IssueRecord,
    pub is_selected: bool,
}

/// Results panel state: the displayed issues in card order
#[derive(Debug, Clone, Default)]
pub struct IssuePanel {
    cards: Vec<IssueCard>,
    summary: String,
    recommendations: Vec<String>,
    selected: Option<usize>,
}

impl IssuePanel {
    /// Panel for an already filtered result
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            cards: result
                .issues
                .iter()
                .cloned()
                .enumerate()
                .map(|(index, issue)| IssueCard {
                    index,
                    issue,
                    is_selected: false,
                })
                .collect(),
            summary: result.summary.clone(),
            recommendations: result.recommendations.clone(),
            selected: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Mark the card at `index` selected and return the exact record it
    /// shows. An unknown index clears the selection.
    pub fn select(&mut self, index: usize) -> Option<&IssueRecord> {
        for card in &mut self.cards {
            card.is_selected = card.index == index;
        }
        self.selected = self.cards.get(index).map(|card| card.index);
        self.selected.map(|i| &self.cards[i].issue)
    }

    pub fn selected(&self) -> Option<&IssueCard> {
        self.selected.and_then(|i| self.cards.get(i))
    }

    /// Inner markup of the panel root element
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<div class=\"panel-header\"><h3>Privacy Analysis Results</h3>\
             <button class=\"{}\">\u{00d7}</button></div>",
            CLOSE_BUTTON_CLASS
        ));
        out.push_str("<div class=\"panel-content\"><div class=\"analysis-summary\">");
        out.push_str(&format!(
            "<p><strong>Issues Found:</strong> {}</p><p><strong>Summary:</strong> {}</p></div>",
            self.cards.len(),
            escape(&self.summary)
        ));

        out.push_str("<div class=\"issues-list\">");
        if self.cards.is_empty() {
            out.push_str("<p class=\"no-issues\">No major privacy concerns detected!</p>");
        }
        for card in &self.cards {
            let issue = &card.issue;
            let severity = issue.severity.as_str();
            out.push_str(&format!(
                "<div class=\"{} {}\" {}=\"{}\"><div class=\"issue-header\">\
                 <span class=\"severity-badge severity-{}\">{}</span>\
                 <span class=\"issue-title\">{}</span></div>\
                 <div class=\"issue-description\">{}</div>\
                 <div class=\"issue-category\"><strong>Category:</strong> {}</div>\
                 <div class=\"issue-suggestion\"><strong>Legal Suggestion:</strong> {}</div>\
                 <div class=\"issue-context\"><strong>Found in text:</strong>\
                 <div class=\"context-text\">\"{}\"</div></div></div>",
                CARD_CLASS,
                severity,
                CARD_INDEX_ATTR,
                card.index,
                severity,
                severity.to_uppercase(),
                escape(&issue.title),
                escape(&issue.description),
                escape(&issue.category),
                escape(&issue.legal_suggestion),
                escape(&issue.matched_text),
            ));
        }
        out.push_str("</div>");

        out.push_str("<div class=\"recommendations\"><h4>Recommendations:</h4><ul>");
        for rec in &self.recommendations {
            out.push_str(&format!("<li>{}</li>", escape(rec)));
        }
        out.push_str("</ul></div></div>");
        out
    }
}

/// Card index carried by a clicked panel element
pub fn card_index(value: &str) -> Option<usize> {
    value.trim().parse().ok()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
