use policy_engine::ProgressIndicator;
use web_sys::Document;

const PROGRESS_CLASS: &str = "privacy-analysis-progress";

/// Spinner overlay shown while an analysis runs
pub struct OverlayProgress {
    document: Document,
    message: String,
}

impl OverlayProgress {
    pub fn new(document: Document, message: impl Into<String>) -> Self {
        Self {
            document,
            message: message.into(),
        }
    }
}

impl ProgressIndicator for OverlayProgress {
    fn show(&self) {
        let Some(body) = self.document.body() else {
            return;
        };
        let Ok(overlay) = self.document.create_element("div") else {
            return;
        };
        overlay.set_class_name(PROGRESS_CLASS);
        overlay.set_inner_html(
            "<div class=\"progress-content\"><div class=\"progress-spinner\"></div>\
             <div class=\"progress-text\"></div></div>",
        );
        if let Ok(Some(text)) = overlay.query_selector(".progress-text") {
            text.set_text_content(Some(&self.message));
        }
        if body.append_child(&overlay).is_err() {
            tracing::warn!("could not show progress overlay");
        }
    }

    fn hide(&self) {
        let overlays = self.document.get_elements_by_class_name(PROGRESS_CLASS);
        let found: Vec<_> = (0..overlays.length())
            .filter_map(|i| overlays.item(i))
            .collect();
        for overlay in found {
            overlay.remove();
        }
    }
}
