use anyhow::{anyhow, Context};
use page_dom::{Document, ExtractOptions};
use policy_engine::remote::GeminiClient;
use policy_engine::{
    AnalysisError, AnalysisOutcome, AnalyzerRegistry, Detector, PageAnalyzer, RemoteConfig,
    RemoteDetector,
};
use serde::Serialize;
use shared_types::{AnalysisResult, IssueRecord, Settings};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub mod backoff;
pub mod panel_view;
pub mod progress;
pub mod storage;
pub mod web_dom;

pub use backoff::TimerBackoff;
pub use progress::OverlayProgress;
pub use storage::LocalStore;
pub use web_dom::WebDom;

thread_local! {
    static REGISTRY: AnalyzerRegistry<LocalStore> = AnalyzerRegistry::new();
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

fn js_error(err: JsValue) -> anyhow::Error {
    anyhow!(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

fn window_document() -> anyhow::Result<web_sys::Document> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| anyhow!("No document"))
}

fn current_url() -> String {
    web_sys::window()
        .and_then(|window| window.location().href().ok())
        .unwrap_or_default()
}

/// Snapshot of the live page as an arena document
fn snapshot_page() -> anyhow::Result<Document> {
    let html = window_document()?
        .document_element()
        .map(|root| root.outer_html())
        .ok_or_else(|| anyhow!("Document has no root element"))?;
    Ok(Document::parse_with_url(&html, &current_url()))
}

fn parse_settings(settings_json: &str) -> anyhow::Result<Settings> {
    if settings_json.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_json::from_str(settings_json).context("Failed to parse settings")
}

fn current_analyzer() -> anyhow::Result<Rc<PageAnalyzer<LocalStore>>> {
    REGISTRY
        .with(|registry| registry.current())
        .ok_or_else(|| anyhow!("Page analyzer is not initialized"))
}

fn remote_detector() -> anyhow::Result<RemoteDetector> {
    let config = RemoteConfig::default();
    let client = GeminiClient::new(config.base_url.clone())?;
    Ok(RemoteDetector::new(
        Box::new(client),
        Box::new(TimerBackoff),
        config,
    ))
}

/// Outcome of `startAnalysis` as seen by the extension scripts
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
enum AnalysisReply {
    Skipped,
    Cancelled,
    Completed { result: AnalysisResult },
    Error { error: String },
}

impl From<AnalysisOutcome> for AnalysisReply {
    fn from(outcome: AnalysisOutcome) -> Self {
        match outcome {
            AnalysisOutcome::Skipped => AnalysisReply::Skipped,
            AnalysisOutcome::Cancelled => AnalysisReply::Cancelled,
            AnalysisOutcome::Completed(result) => AnalysisReply::Completed { result },
            AnalysisOutcome::Failed(err) => AnalysisReply::Error {
                error: err.to_string(),
            },
        }
    }
}

/// Create the analyzer for this page visit, replacing any previous one.
/// Returns the visit id.
#[wasm_bindgen(js_name = initPageAnalyzer)]
pub fn init_page_analyzer() -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let store = LocalStore::open().map_err(|e| to_js(e.into()))?;
    let visit_id = uuid::Uuid::new_v4().to_string();
    let analyzer = PageAnalyzer::new(visit_id.clone(), current_url(), store);
    REGISTRY.with(|registry| registry.install(analyzer));
    Ok(visit_id)
}

/// Tear down on navigation or unload; the visit's stored record is removed
#[wasm_bindgen(js_name = teardownPageAnalyzer)]
pub fn teardown_page_analyzer() -> bool {
    REGISTRY.with(|registry| registry.teardown())
}

#[wasm_bindgen(js_name = extractPolicyText)]
pub fn extract_policy_text(substantial: bool) -> Result<String, JsValue> {
    let options = if substantial {
        ExtractOptions::substantial()
    } else {
        ExtractOptions::first_match()
    };
    let page = snapshot_page().map_err(to_js)?;
    Ok(page_dom::extract_policy_text(&page, &options))
}

/// Strict check used to gate a full analysis
#[wasm_bindgen(js_name = hasPrivacyContent)]
pub fn has_privacy_content() -> bool {
    match snapshot_page() {
        Ok(page) => page_dom::strict_privacy_check(&page),
        Err(err) => {
            web_sys::console::error_1(&format!("Error detecting privacy content: {:#}", err).into());
            false
        }
    }
}

#[wasm_bindgen(js_name = quickPrivacyCheck)]
pub fn quick_privacy_check() -> bool {
    snapshot_page()
        .map(|page| page_dom::quick_privacy_check(&page))
        .unwrap_or(false)
}

#[wasm_bindgen(js_name = isPrivacyRelatedUrl)]
pub fn is_privacy_related_url(url: &str) -> bool {
    page_dom::is_privacy_related_url(url)
}

/// Run one analysis of the current page. Resolves to a JSON reply whose
/// `status` is one of `skipped`, `cancelled`, `completed` or `error`.
#[wasm_bindgen(js_name = startAnalysis)]
pub async fn start_analysis(settings_json: String) -> Result<String, JsValue> {
    run_analysis(&settings_json).await.map_err(to_js)
}

async fn run_analysis(settings_json: &str) -> anyhow::Result<String> {
    let settings = parse_settings(settings_json)?;
    let analyzer = current_analyzer()?;
    let document = window_document()?;

    let text = page_dom::extract_policy_text(&snapshot_page()?, &ExtractOptions::first_match());
    let remote = if settings.wants_remote() {
        Some(remote_detector()?)
    } else {
        None
    };
    let detector = Detector::select(&settings, remote);
    let progress = OverlayProgress::new(document.clone(), "Analyzing privacy policy...");

    let outcome = analyzer
        .start_analysis(&text, &settings, &detector, &progress)
        .await;

    if let AnalysisOutcome::Completed(result) = &outcome {
        panel_view::show_panel(&document, result).map_err(js_error)?;
    }
    Ok(serde_json::to_string(&AnalysisReply::from(outcome))?)
}

/// Open the results panel from the latest analysis. Returns false when no
/// analysis exists yet for this visit.
#[wasm_bindgen(js_name = showPanel)]
pub fn show_panel(settings_json: &str) -> Result<bool, JsValue> {
    let settings = parse_settings(settings_json).map_err(to_js)?;
    let analyzer = current_analyzer().map_err(to_js)?;

    let result = match analyzer.current_result(&settings) {
        Ok(result) => result,
        Err(AnalysisError::NoAnalysisAvailable) => {
            web_sys::console::warn_1(&"No analysis results found. Run an analysis first.".into());
            return Ok(false);
        }
        Err(err) => return Err(to_js(err.into())),
    };

    let document = window_document().map_err(to_js)?;
    panel_view::show_panel(&document, &result)?;
    Ok(true)
}

/// Highlight one issue record (JSON). Returns whether a marker was placed.
#[wasm_bindgen(js_name = highlightIssue)]
pub fn highlight_issue(issue_json: &str) -> Result<bool, JsValue> {
    let issue: IssueRecord = serde_json::from_str(issue_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse issue: {}", e)))?;
    let mut dom = WebDom::current().map_err(|e| to_js(e.into()))?;
    Ok(page_dom::highlight_issue(&mut dom, &issue).placed())
}

#[wasm_bindgen(js_name = removeHighlights)]
pub fn remove_highlights() -> Result<u32, JsValue> {
    let mut dom = WebDom::current().map_err(|e| to_js(e.into()))?;
    Ok(page_dom::remove_highlights(&mut dom) as u32)
}

/// Check an API key against the probe models. Resolves to the first model
/// that answered.
#[wasm_bindgen(js_name = testApiKey)]
pub async fn test_api_key(api_key: String) -> Result<String, JsValue> {
    let client = GeminiClient::new(policy_engine::remote::DEFAULT_BASE_URL).map_err(|e| to_js(e.into()))?;
    policy_engine::remote::probe_api_key(&client, &api_key)
        .await
        .map(str::to_string)
        .map_err(|e| to_js(e.into()))
}
