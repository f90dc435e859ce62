//! Typed UI events and the loop that dispatches them.
//!
//! Producers (the CLI, a test, a timer) push [`UiEvent`]s into the channel
//! returned by [`App::new`]; [`App::run`] handles them on the current task.
//! Handlers overlap the way browser callbacks do: a second submit can arrive
//! while the first request is still pending and will hit the busy guard.

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::mpsc;

use crate::api::SearchApi;
use crate::charts::ChartBackend;
use crate::controller::SearchController;
use crate::dashboard::DashboardUpdater;
use crate::data_models::SearchType;
use crate::error::Result;
use crate::export::ExportFormat;
use crate::form::{FormFields, detect_search_type};
use crate::history::{HistoryFilter, HistoryTable};
use crate::notify::Notification;
use crate::util::{Debouncer, Theme};
use crate::view::{Field, Region, View};

const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn plain(key: &str) -> KeyEvent {
        KeyEvent {
            key: key.to_string(),
            ctrl: false,
            meta: false,
        }
    }

    pub fn ctrl(key: &str) -> KeyEvent {
        KeyEvent {
            ctrl: true,
            ..KeyEvent::plain(key)
        }
    }

    pub fn shortcut(&self) -> Option<Shortcut> {
        let modifier = self.ctrl || self.meta;
        match self.key.as_str() {
            "Enter" if modifier => Some(Shortcut::Submit),
            "/" if modifier => Some(Shortcut::FocusSearch),
            "Escape" => Some(Shortcut::Dismiss),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Ctrl/Cmd+Enter
    Submit,
    /// Ctrl/Cmd+/
    FocusSearch,
    /// Escape: clear the form and close open modals.
    Dismiss,
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The form changed; keeps the fields Ctrl+Enter will submit.
    FormChanged(FormFields),
    Submit(FormFields),
    QueryInput(String),
    DorkingToggled(bool),
    ClearForm,
    Key(KeyEvent),
    QuickSearch { query: String, search_type: SearchType },
    ExportResults(Option<ExportFormat>),
    ExportHistory,
    SaveResult(usize),
    ShareResult(usize),
    AnalyzeResult(usize),
    FilterHistory(HistoryFilter),
    SortHistory(usize),
    ToggleSelectAll(bool),
    RefreshDashboard,
    /// Raw window resize; bursts collapse into one [`UiEvent::ResizeCharts`].
    Resize,
    ResizeCharts,
    Close,
}

pub struct App<A, V, B: ChartBackend> {
    controller: SearchController<A, V>,
    dashboard: DashboardUpdater<B>,
    history: RefCell<Option<HistoryTable>>,
    form: RefCell<FormFields>,
    resize: Debouncer,
    /// Events handed to [`App::schedule`] that have not been delivered yet.
    scheduled: Arc<AtomicUsize>,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl<A: SearchApi, V: View, B: ChartBackend> App<A, V, B> {
    pub fn new(
        controller: SearchController<A, V>,
        dashboard: DashboardUpdater<B>,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App {
            controller,
            dashboard,
            history: RefCell::new(None),
            form: RefCell::new(FormFields::default()),
            resize: Debouncer::new(RESIZE_DEBOUNCE),
            scheduled: Arc::new(AtomicUsize::new(0)),
            events: tx,
        };
        (app, rx)
    }

    pub fn controller(&self) -> &SearchController<A, V> {
        &self.controller
    }

    pub fn dashboard(&self) -> &DashboardUpdater<B> {
        &self.dashboard
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<UiEvent> {
        self.events.clone()
    }

    fn view(&self) -> &V {
        self.controller.view()
    }

    pub fn initialize(&self, saved_theme: Option<&str>, system_prefers_dark: bool) {
        log::info!("dorkscope ui starting");
        self.view()
            .apply_theme(Theme::resolve(saved_theme, system_prefers_dark));
        self.view().hide(Region::DorkingOptions);
        log::info!("dorkscope ui ready");
    }

    /// Loads the server-rendered history table that filter/sort act on.
    pub fn load_history(&self, page_html: &str) -> Result<usize> {
        let table = HistoryTable::parse(page_html)?;
        let rows = table.rows().len();
        self.view()
            .set_html(Region::HistoryRows, table.render_rows());
        *self.history.borrow_mut() = Some(table);
        Ok(rows)
    }

    pub fn history(&self) -> Option<HistoryTable> {
        self.history.borrow().clone()
    }

    /// Dispatches events until [`UiEvent::Close`] arrives. Closing waits for
    /// running handlers, already queued events and events still pending in
    /// [`schedule`](Self::schedule), such as the dashboard refresh that
    /// follows a search.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<UiEvent>) {
        let mut pending = FuturesUnordered::new();
        let mut closing = false;
        loop {
            if closing
                && pending.is_empty()
                && rx.is_empty()
                && self.scheduled.load(Ordering::SeqCst) == 0
            {
                break;
            }
            tokio::select! {
                event = rx.recv() => match event {
                    Some(UiEvent::Close) => {
                        log::debug!("close requested, draining pending work");
                        closing = true;
                    }
                    Some(event) => pending.push(self.handle(event)),
                    None => break,
                },
                Some(()) = pending.next(), if !pending.is_empty() => {}
            }
        }
        while pending.next().await.is_some() {}
    }

    pub async fn handle(&self, event: UiEvent) {
        match event {
            UiEvent::FormChanged(fields) => *self.form.borrow_mut() = fields,
            UiEvent::Submit(fields) => {
                *self.form.borrow_mut() = fields.clone();
                self.submit(fields).await;
            }
            UiEvent::QueryInput(value) => {
                self.form.borrow_mut().query = value.clone();
                if let Some(kind) = detect_search_type(&value) {
                    self.form.borrow_mut().search_type = kind.to_string();
                    self.view().select_search_type(kind);
                }
            }
            UiEvent::DorkingToggled(enabled) => {
                self.form.borrow_mut().enable_dorking = enabled.then(|| "on".to_string());
                if enabled {
                    self.view().show(Region::DorkingOptions);
                    self.view().animate(Region::DorkingOptions, "fade-in");
                } else {
                    self.view().hide(Region::DorkingOptions);
                }
            }
            UiEvent::ClearForm => self.clear_form(),
            UiEvent::Key(key) => self.on_key(&key).await,
            UiEvent::QuickSearch { query, search_type } => {
                let _ = self.controller.quick_search(&query, search_type).await;
            }
            UiEvent::ExportResults(format) => {
                let _ = self.controller.export_results(format);
            }
            UiEvent::ExportHistory => self.controller.export_history(),
            UiEvent::SaveResult(index) => {
                self.controller.save_result(index);
            }
            UiEvent::ShareResult(index) => {
                self.controller.share_result(index);
            }
            UiEvent::AnalyzeResult(index) => {
                self.controller.analyze_result(index);
            }
            UiEvent::FilterHistory(filter) => {
                self.with_history(|table| {
                    table.apply_filter(&filter, Utc::now());
                });
            }
            UiEvent::SortHistory(column) => self.with_history(|table| table.sort_by_column(column)),
            UiEvent::ToggleSelectAll(checked) => {
                self.with_history(|table| table.toggle_select_all(checked))
            }
            UiEvent::RefreshDashboard => {
                self.dashboard
                    .refresh(self.controller.api(), self.view())
                    .await;
            }
            UiEvent::Resize => {
                let tx = self.events.clone();
                self.resize.call(move || {
                    let _ = tx.send(UiEvent::ResizeCharts);
                });
            }
            UiEvent::ResizeCharts => self.dashboard.resize(),
            UiEvent::Close => {}
        }
    }

    async fn submit(&self, fields: FormFields) {
        if let Ok(summary) = self.controller.submit(&fields).await {
            if let Some(delay) = summary.refresh_dashboard_after {
                self.schedule(UiEvent::RefreshDashboard, delay);
            }
        }
    }

    /// Delivers `event` to this app after `delay`. Needs a tokio runtime.
    pub fn schedule(&self, event: UiEvent, delay: Duration) {
        let tx = self.events.clone();
        let scheduled = self.scheduled.clone();
        scheduled.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // the loop may be gone by now
            let _ = tx.send(event);
            scheduled.fetch_sub(1, Ordering::SeqCst);
        });
    }

    async fn on_key(&self, key: &KeyEvent) {
        match key.shortcut() {
            Some(Shortcut::Submit) => {
                if !self.controller.session().is_in_progress() {
                    let fields = self.form.borrow().clone();
                    self.submit(fields).await;
                }
            }
            Some(Shortcut::FocusSearch) => self.view().focus(Field::Query),
            Some(Shortcut::Dismiss) => {
                self.view().close_modals();
                self.clear_form();
            }
            None => {}
        }
    }

    pub fn clear_form(&self) {
        *self.form.borrow_mut() = FormFields::default();
        self.view().reset_form();
        self.view().hide(Region::DorkingOptions);
        self.view().hide(Region::ResultsSection);
        self.controller.notify(Notification::info("Form cleared."));
    }

    fn with_history(&self, f: impl FnOnce(&mut HistoryTable)) {
        let mut history = self.history.borrow_mut();
        match history.as_mut() {
            Some(table) => {
                f(table);
                self.view()
                    .set_html(Region::HistoryRows, table.render_rows());
            }
            None => log::warn!("history event ignored, no history table loaded"),
        }
    }
}

#[test]
fn test_shortcut_mapping() {
    assert_eq!(KeyEvent::ctrl("Enter").shortcut(), Some(Shortcut::Submit));
    assert_eq!(KeyEvent::plain("Enter").shortcut(), None);
    assert_eq!(
        KeyEvent {
            key: "/".to_string(),
            ctrl: false,
            meta: true
        }
        .shortcut(),
        Some(Shortcut::FocusSearch)
    );
    assert_eq!(KeyEvent::plain("Escape").shortcut(), Some(Shortcut::Dismiss));
}
