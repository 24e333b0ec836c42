//! Per-page analysis session
//!
//! A [`PageAnalyzer`] owns the state of one page visit: the in-flight flag,
//! the latest filtered result and the persisted record. At most one analysis
//! runs at a time; a second request while one is pending is dropped.

use crate::detector::IssueDetector;
use crate::error::AnalysisError;
use crate::store::AnalysisStore;
use shared_types::{AnalysisResult, SeverityFilter, Settings, StoredAnalysis};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shown while a detection run is pending
pub trait ProgressIndicator {
    fn show(&self);
    fn hide(&self);
}

/// Progress sink for callers without a UI
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressIndicator for NoProgress {
    fn show(&self) {}
    fn hide(&self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Another analysis was already running; nothing was done
    Skipped,
    /// Filtered view of the fresh result
    Completed(AnalysisResult),
    /// The page was torn down before the run finished; nothing was kept
    Cancelled,
    /// The run failed and an error record was persisted
    Failed(AnalysisError),
}

fn severity_phrase(filter: &SeverityFilter) -> String {
    if filter.is_all() {
        "severity concerns".to_string()
    } else {
        format!("{} severity concerns", filter.label())
    }
}

/// Summary shown right after a run
pub fn fresh_summary(analyzed_chars: usize, shown: usize, filter: &SeverityFilter) -> String {
    format!(
        "Analyzed {} characters. Found {} {}.",
        analyzed_chars,
        shown,
        severity_phrase(filter)
    )
}

/// Summary shown when a persisted result is reopened
pub fn stored_summary(total: usize, shown: usize, filter: &SeverityFilter) -> String {
    format!(
        "Analyzed {} total issues. Showing {} {}.",
        total,
        shown,
        severity_phrase(filter)
    )
}

/// Clears the in-flight flag however the run ends
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct PageAnalyzer<S: AnalysisStore> {
    visit_id: String,
    url: String,
    store: S,
    analyzing: Cell<bool>,
    torn_down: Cell<bool>,
    latest: RefCell<Option<AnalysisResult>>,
}

impl<S: AnalysisStore> PageAnalyzer<S> {
    pub fn new(visit_id: impl Into<String>, url: impl Into<String>, store: S) -> Self {
        Self {
            visit_id: visit_id.into(),
            url: url.into(),
            store,
            analyzing: Cell::new(false),
            torn_down: Cell::new(false),
            latest: RefCell::new(None),
        }
    }

    pub fn visit_id(&self) -> &str {
        &self.visit_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing.get()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }

    /// Run one analysis over `text`.
    ///
    /// The full result is persisted; the returned and cached result is
    /// filtered by the settings' severity selection. A run that outlives
    /// [`teardown`](Self::teardown) is dropped without persisting anything.
    pub async fn start_analysis(
        &self,
        text: &str,
        settings: &Settings,
        detector: &dyn IssueDetector,
        progress: &dyn ProgressIndicator,
    ) -> AnalysisOutcome {
        if self.torn_down.get() {
            tracing::debug!(visit = %self.visit_id, "analyzer already torn down");
            return AnalysisOutcome::Cancelled;
        }
        if self.analyzing.replace(true) {
            tracing::debug!(visit = %self.visit_id, "analysis already in progress");
            return AnalysisOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.analyzing);

        progress.show();
        let outcome = detector.detect(text, settings).await;
        progress.hide();

        if self.torn_down.get() {
            tracing::debug!(visit = %self.visit_id, "page torn down during analysis, dropping result");
            return AnalysisOutcome::Cancelled;
        }

        match outcome {
            Ok(result) => {
                self.persist(&StoredAnalysis::completed(
                    result.clone(),
                    &self.url,
                    now_millis(),
                ));

                let filter = settings.severity_filter();
                let issues = filter.apply(&result.issues);
                let view = AnalysisResult {
                    summary: fresh_summary(text.chars().count(), issues.len(), &filter),
                    issues,
                    recommendations: result.recommendations,
                };
                *self.latest.borrow_mut() = Some(view.clone());
                AnalysisOutcome::Completed(view)
            }
            Err(err) => {
                tracing::error!(%err, "analysis failed");
                self.persist(&StoredAnalysis::failed(&err.to_string(), &self.url, now_millis()));
                AnalysisOutcome::Failed(err)
            }
        }
    }

    /// Latest result for display: the in-memory one, else the persisted one
    /// filtered with the current settings.
    pub fn current_result(&self, settings: &Settings) -> Result<AnalysisResult, AnalysisError> {
        if let Some(result) = self.latest.borrow().as_ref() {
            return Ok(result.clone());
        }

        let stored = match self.store.load(&self.visit_id) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(%err, "failed to load stored analysis");
                None
            }
        };
        let result = stored
            .as_ref()
            .and_then(StoredAnalysis::to_result)
            .ok_or(AnalysisError::NoAnalysisAvailable)?;

        let filter = settings.severity_filter();
        let issues = filter.apply(&result.issues);
        let view = AnalysisResult {
            summary: stored_summary(result.issues.len(), issues.len(), &filter),
            issues,
            recommendations: result.recommendations,
        };
        *self.latest.borrow_mut() = Some(view.clone());
        Ok(view)
    }

    /// Drop cached state and the persisted record for this visit. Any run
    /// still pending is cancelled.
    pub fn teardown(&self) {
        self.torn_down.set(true);
        self.latest.borrow_mut().take();
        if let Err(err) = self.store.remove(&self.visit_id) {
            tracing::warn!(%err, visit = %self.visit_id, "failed to remove stored analysis");
        }
    }

    fn persist(&self, record: &StoredAnalysis) {
        if let Err(err) = self.store.save(&self.visit_id, record) {
            tracing::error!(%err, "failed to store analysis record");
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Holder for the analyzer of the current page context.
///
/// Installed when the content context starts and torn down on navigation;
/// lookups while nothing is installed return `None`.
pub struct AnalyzerRegistry<S: AnalysisStore> {
    current: RefCell<Option<Rc<PageAnalyzer<S>>>>,
}

impl<S: AnalysisStore> Default for AnalyzerRegistry<S> {
    fn default() -> Self {
        Self {
            current: RefCell::new(None),
        }
    }
}

impl<S: AnalysisStore> AnalyzerRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `analyzer`, tearing down any previous one
    pub fn install(&self, analyzer: PageAnalyzer<S>) -> Rc<PageAnalyzer<S>> {
        self.teardown();
        let analyzer = Rc::new(analyzer);
        tracing::debug!(visit = %analyzer.visit_id(), "page analyzer installed");
        *self.current.borrow_mut() = Some(Rc::clone(&analyzer));
        analyzer
    }

    pub fn current(&self) -> Option<Rc<PageAnalyzer<S>>> {
        self.current.borrow().clone()
    }

    /// Remove the installed analyzer and its persisted record
    pub fn teardown(&self) -> bool {
        let previous = self.current.borrow_mut().take();
        match previous {
            Some(analyzer) => {
                analyzer.teardown();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use shared_types::{AnalysisStatus, IssueRecord, Severity};

    struct Counting {
        calls: Cell<u32>,
        fail: bool,
    }

    impl Counting {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    fn issue(id: &str, severity: Severity) -> IssueRecord {
        IssueRecord {
            id: id.into(),
            severity,
            category: "Tracking".into(),
            title: id.into(),
            description: String::new(),
            legal_suggestion: String::new(),
            matched_text: String::new(),
            context: String::new(),
            position: None,
        }
    }

    #[async_trait(?Send)]
    impl IssueDetector for Counting {
        async fn detect(&self, _text: &str, _settings: &Settings) -> Result<AnalysisResult, AnalysisError> {
            self.calls.set(self.calls.get() + 1);
            tokio::task::yield_now().await;
            if self.fail {
                return Err(AnalysisError::InsufficientContent {
                    length: 3,
                    minimum: 100,
                });
            }
            Ok(AnalysisResult {
                issues: vec![
                    issue("a", Severity::High),
                    issue("b", Severity::Low),
                    issue("c", Severity::Medium),
                ],
                summary: "raw".into(),
                recommendations: vec!["r".into()],
            })
        }
    }

    #[derive(Default)]
    struct Spinner {
        shown: Cell<u32>,
        hidden: Cell<u32>,
    }

    impl ProgressIndicator for Spinner {
        fn show(&self) {
            self.shown.set(self.shown.get() + 1);
        }
        fn hide(&self) {
            self.hidden.set(self.hidden.get() + 1);
        }
    }

    fn analyzer() -> PageAnalyzer<MemoryStore> {
        PageAnalyzer::new("visit-1", "https://example.com/privacy", MemoryStore::new())
    }

    #[tokio::test]
    async fn test_concurrent_start_runs_detector_once() {
        let analyzer = analyzer();
        let detector = Counting::new(false);
        let settings = Settings::default();
        let spinner = Spinner::default();

        let (first, second) = tokio::join!(
            analyzer.start_analysis("text", &settings, &detector, &spinner),
            analyzer.start_analysis("text", &settings, &detector, &spinner),
        );

        assert_eq!(detector.calls.get(), 1);
        assert!(matches!(first, AnalysisOutcome::Completed(_)));
        assert_eq!(second, AnalysisOutcome::Skipped);
        assert_eq!(spinner.shown.get(), 1);
        assert_eq!(spinner.hidden.get(), 1);
        assert!(!analyzer.is_analyzing());
    }

    #[tokio::test]
    async fn test_completed_run_filters_view_and_stores_everything() {
        let analyzer = analyzer();
        let detector = Counting::new(false);

        let outcome = analyzer
            .start_analysis("x".repeat(150).as_str(), &Settings::default(), &detector, &NoProgress)
            .await;

        let AnalysisOutcome::Completed(view) = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(view.issues.len(), 2);
        assert_eq!(
            view.summary,
            "Analyzed 150 characters. Found 2 high/medium severity concerns."
        );

        let stored = analyzer.store().load("visit-1").unwrap().unwrap();
        assert_eq!(stored.status, AnalysisStatus::Completed);
        assert_eq!(stored.issues.len(), 3);
        assert_eq!(stored.url, "https://example.com/privacy");
    }

    #[tokio::test]
    async fn test_failed_run_persists_error_record() {
        let analyzer = analyzer();
        let detector = Counting::new(true);

        let outcome = analyzer
            .start_analysis("abc", &Settings::default(), &detector, &NoProgress)
            .await;

        assert!(matches!(outcome, AnalysisOutcome::Failed(AnalysisError::InsufficientContent { .. })));
        let stored = analyzer.store().load("visit-1").unwrap().unwrap();
        assert_eq!(stored.status, AnalysisStatus::Error);
        assert!(stored.error.unwrap().starts_with("Insufficient content"));
        assert_eq!(
            analyzer.current_result(&Settings::default()),
            Err(AnalysisError::NoAnalysisAvailable)
        );
    }

    #[test]
    fn test_current_result_reads_store_with_current_filter() {
        let store = MemoryStore::new();
        store
            .save(
                "visit-1",
                &StoredAnalysis::completed(
                    AnalysisResult {
                        issues: vec![issue("a", Severity::High), issue("b", Severity::Low)],
                        summary: "raw".into(),
                        recommendations: vec![],
                    },
                    "https://example.com",
                    1,
                ),
            )
            .unwrap();
        let analyzer = PageAnalyzer::new("visit-1", "https://example.com", store);
        let settings = Settings {
            highlight_severity: Severity::ALL.to_vec(),
            ..Settings::default()
        };

        let view = analyzer.current_result(&settings).unwrap();
        assert_eq!(view.issues.len(), 2);
        assert_eq!(view.summary, "Analyzed 2 total issues. Showing 2 severity concerns.");
    }

    #[test]
    fn test_no_result_before_analysis() {
        assert_eq!(
            analyzer().current_result(&Settings::default()),
            Err(AnalysisError::NoAnalysisAvailable)
        );
    }

    #[tokio::test]
    async fn test_teardown_during_pending_run_keeps_store_empty() {
        let registry = AnalyzerRegistry::new();
        let installed = registry.install(analyzer());
        let detector = Counting::new(false);
        let settings = Settings::default();

        let (outcome, torn_down) = tokio::join!(
            installed.start_analysis("text", &settings, &detector, &NoProgress),
            async { registry.teardown() },
        );

        assert!(torn_down);
        assert_eq!(detector.calls.get(), 1);
        assert_eq!(outcome, AnalysisOutcome::Cancelled);
        assert!(installed.store().load("visit-1").unwrap().is_none());
        assert_eq!(
            installed.current_result(&Settings::default()),
            Err(AnalysisError::NoAnalysisAvailable)
        );
        assert!(!installed.is_analyzing());

        let again = installed
            .start_analysis("text", &Settings::default(), &detector, &NoProgress)
            .await;
        assert_eq!(again, AnalysisOutcome::Cancelled);
        assert_eq!(detector.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = AnalyzerRegistry::new();
        assert!(registry.current().is_none());
        assert!(!registry.teardown());

        let installed = registry.install(analyzer());
        installed
            .start_analysis("text", &Settings::default(), &Counting::new(false), &NoProgress)
            .await;
        assert!(installed.store().load("visit-1").unwrap().is_some());
        assert_eq!(registry.current().unwrap().visit_id(), "visit-1");

        assert!(registry.teardown());
        assert!(registry.current().is_none());
        assert!(installed.store().load("visit-1").unwrap().is_none());
        assert_eq!(
            installed.current_result(&Settings::default()),
            Err(AnalysisError::NoAnalysisAvailable)
        );
    }
}
