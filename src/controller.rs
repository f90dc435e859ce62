//! Search request lifecycle.
//!
//! One [`SearchController`] owns the session state for a page: whether a
//! search is in flight, the id of the last search and the last result batch.
//! Only one full search may be in flight at a time; the flag is held by an
//! [`InFlightGuard`] so it is cleared on every exit path.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use tracing::Instrument;

use crate::api::SearchApi;
use crate::api::models::SearchResponse;
use crate::data_models::{SearchRequest, SearchResult, SearchType};
use crate::error::{ClientError, Result};
use crate::form::{FormFields, prepare_search_data, validate};
use crate::notify::Notification;
use crate::render::{
    render_error_panel, render_quick_error, render_quick_results, render_results,
    render_results_header,
};
use crate::view::{Field, Region, View};

const PROGRESS_TICK: Duration = Duration::from_millis(500);
const PROGRESS_CEILING: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    InFlight,
    Done,
    Failed,
}

#[derive(Debug)]
pub struct Session {
    in_progress: Cell<bool>,
    phase: Cell<SearchPhase>,
    current_search_id: RefCell<Option<String>>,
    results: RefCell<Vec<SearchResult>>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            in_progress: Cell::new(false),
            phase: Cell::new(SearchPhase::Idle),
            current_search_id: RefCell::new(None),
            results: RefCell::new(Vec::new()),
        }
    }
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.get()
    }

    /// `Done`/`Failed` describe the last completed search; they read as
    /// idle for the purpose of accepting a new one.
    pub fn phase(&self) -> SearchPhase {
        self.phase.get()
    }

    pub fn current_search_id(&self) -> Option<String> {
        self.current_search_id.borrow().clone()
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.results.borrow().clone()
    }

    pub fn result(&self, index: usize) -> Option<SearchResult> {
        self.results.borrow().get(index).cloned()
    }

    pub fn result_count(&self) -> usize {
        self.results.borrow().len()
    }

    /// Claims the in-flight flag, or `None` when a search is already running.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        if self.in_progress.replace(true) {
            return None;
        }
        Some(InFlightGuard { session: self })
    }

    fn replace_results(&self, search_id: Option<String>, results: Vec<SearchResult>) {
        *self.current_search_id.borrow_mut() = search_id;
        *self.results.borrow_mut() = results;
    }
}

pub struct InFlightGuard<'a> {
    session: &'a Session,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.session.in_progress.set(false);
        if self.session.phase.get() == SearchPhase::InFlight {
            // dropped mid-request, e.g. the future was abandoned
            self.session.phase.set(SearchPhase::Idle);
        }
    }
}

/// Loading state of one region, torn down on drop so an abandoned request
/// does not leave a spinner or a disabled submit button behind.
struct LoadingIndicator<'a, V: View> {
    view: &'a V,
    region: Region,
    submit_busy: bool,
}

impl<'a, V: View> LoadingIndicator<'a, V> {
    fn show(view: &'a V, region: Region, submit_busy: bool) -> Self {
        view.show(region);
        if submit_busy {
            view.set_submit_busy(true);
        }
        LoadingIndicator {
            view,
            region,
            submit_busy,
        }
    }
}

impl<V: View> Drop for LoadingIndicator<'_, V> {
    fn drop(&mut self) {
        self.view.hide(self.region);
        if self.submit_busy {
            self.view.set_submit_busy(false);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Path of the page the controller is mounted on.
    pub route: String,
    pub dashboard_refresh_delay: Duration,
    pub notification_duration: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            route: "/".to_string(),
            dashboard_refresh_delay: Duration::from_millis(1000),
            notification_duration: crate::notify::DEFAULT_DURATION,
        }
    }
}

impl ControllerSettings {
    pub fn on_dashboard(&self) -> bool {
        matches!(self.route.as_str(), "/" | "/dashboard")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub search_id: Option<String>,
    pub result_count: usize,
    /// Set when the dashboard should be re-queried after this delay.
    pub refresh_dashboard_after: Option<Duration>,
}

fn advance_progress(current: f64) -> f64 {
    (current + (PROGRESS_CEILING - current) / 3.0 + 5.0).min(PROGRESS_CEILING)
}

pub struct SearchController<A, V> {
    api: A,
    view: V,
    session: Session,
    settings: ControllerSettings,
}

impl<A: SearchApi, V: View> SearchController<A, V> {
    pub fn new(api: A, view: V, settings: ControllerSettings) -> Self {
        SearchController {
            api,
            view,
            session: Session::new(),
            settings,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn notify(&self, notification: Notification) {
        self.view
            .notify(notification.with_duration(self.settings.notification_duration));
    }

    /// Form submission: busy check, extraction, validation, then the request.
    /// Every failure has already been shown to the user when this returns.
    pub async fn submit(&self, fields: &FormFields) -> Result<SearchSummary> {
        self.search(prepare_search_data(fields)).await
    }

    /// Same lifecycle as [`submit`](Self::submit) for an already built request.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchSummary> {
        let Some(guard) = self.session.try_begin() else {
            let err = ClientError::Busy;
            self.notify(Notification::warning(err.user_message()));
            return Err(err);
        };

        if let Err(invalid) = validate(&request) {
            self.notify(Notification::new(invalid.to_string(), invalid.kind()));
            if invalid.focuses_query() {
                self.view.focus(Field::Query);
            }
            return Err(invalid.into());
        }

        self.perform(request, guard).await
    }

    async fn perform(
        &self,
        request: SearchRequest,
        _guard: InFlightGuard<'_>,
    ) -> Result<SearchSummary> {
        self.session.phase.set(SearchPhase::InFlight);
        self.view.show(Region::ResultsSection);
        self.view.set_html(Region::SearchResults, String::new());
        self.view.set_progress(0);
        let loading = LoadingIndicator::show(&self.view, Region::SearchProgress, true);

        log::info!(
            "searching: type={} chars={} dorking={}",
            request.search_type,
            request.query.chars().count(),
            request.enable_dorking
        );
        let span = tracing::info_span!("search", search_type = %request.search_type);
        let outcome = self.execute(&request).instrument(span).await;
        drop(loading);

        match outcome {
            Ok(response) => Ok(self.on_success(&request, response)),
            Err(err) => {
                log::error!("search failed: {err:#}");
                self.session.phase.set(SearchPhase::Failed);
                let message = err.user_message();
                self.view
                    .set_html(Region::SearchResults, render_error_panel(&message));
                self.notify(Notification::error(format!("Error: {message}")));
                Err(err)
            }
        }
    }

    async fn execute(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let call = self.api.search(request);
        tokio::pin!(call);
        let mut ticker = tokio::time::interval(PROGRESS_TICK);
        let mut progress = 0.0;

        let response = loop {
            tokio::select! {
                res = &mut call => break res?,
                _ = ticker.tick() => {
                    progress = advance_progress(progress);
                    self.view.set_progress(progress as u8);
                }
            }
        };
        response.into_result()
    }

    fn on_success(&self, request: &SearchRequest, response: SearchResponse) -> SearchSummary {
        let results = response.results.unwrap_or_default();
        let search_id = response.search_id.map(|id| id.to_string());
        let query = response.query.unwrap_or_else(|| request.query.clone());
        let search_type = response
            .search_type
            .unwrap_or_else(|| request.search_type.clone());

        let mut html = render_results_header(
            &query,
            search_type.as_str(),
            results.len(),
            search_id.as_deref(),
        );
        html.push_str(&render_results(&results));
        self.view.set_html(Region::SearchResults, html);
        self.view.animate(Region::SearchResults, "fade-in");

        let result_count = results.len();
        self.session.replace_results(search_id.clone(), results);
        self.session.phase.set(SearchPhase::Done);
        self.notify(Notification::success("Search completed successfully."));
        log::info!("search finished with {result_count} results");

        SearchSummary {
            search_id,
            result_count,
            refresh_dashboard_after: self
                .settings
                .on_dashboard()
                .then_some(self.settings.dashboard_refresh_delay),
        }
    }

    /// The quick-search box. Independent of the in-flight flag and of the
    /// session results; it only fills its own preview pane.
    pub async fn quick_search(&self, query: &str, search_type: SearchType) -> Result<usize> {
        let query = query.trim();
        if query.is_empty() {
            self.notify(Notification::error("Please enter a query"));
            self.view.focus(Field::QuickQuery);
            return Err(crate::error::ValidationError::EmptyQuery.into());
        }

        self.view.show(Region::QuickSearchResults);
        self.view.hide(Region::QuickResultsContainer);
        let loading = LoadingIndicator::show(&self.view, Region::QuickLoading, false);

        let request = SearchRequest::quick(query, search_type);
        let outcome = self
            .api
            .search(&request)
            .await
            .and_then(SearchResponse::into_result);

        let result = match outcome {
            Ok(response) => {
                let results = response.results.unwrap_or_default();
                let shown_query = response.query.unwrap_or_else(|| query.to_string());
                self.view.set_html(
                    Region::QuickResultsContainer,
                    render_quick_results(&results, &shown_query),
                );
                self.notify(Notification::success("Quick search completed"));
                Ok(results.len())
            }
            Err(err) => {
                log::error!("quick search failed: {err:#}");
                self.view.set_html(
                    Region::QuickResultsContainer,
                    render_quick_error(&err.user_message()),
                );
                Err(err)
            }
        };

        drop(loading);
        self.view.show(Region::QuickResultsContainer);
        result
    }
}

#[test]
fn test_progress_never_passes_ceiling() {
    let mut p = 0.0;
    for _ in 0..50 {
        p = advance_progress(p);
        assert!(p <= PROGRESS_CEILING);
    }
    assert_eq!(p, PROGRESS_CEILING);
}
