//! The rendering surface.
//!
//! [`View`] is the port the controller and updaters write to. [`Page`] is the
//! in-memory document used by the CLI and the tests: it keeps region markup,
//! visibility, the submit button state and everything else a browser page
//! would show, and can dump itself as HTML or plain text.

use std::cell::RefCell;
use std::collections::BTreeMap;

use scraper::{Html, Selector};

use crate::data_models::SearchType;
use crate::notify::{Notification, NotificationCenter, NotificationKind};
use crate::render::escape_html;
use crate::util::Theme;

pub const SUBMIT_IDLE_LABEL: &str = "Start Search";
pub const SUBMIT_BUSY_LABEL: &str = "Searching...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    ResultsSection,
    SearchProgress,
    SearchResults,
    QuickSearchResults,
    QuickLoading,
    QuickResultsContainer,
    DorkingOptions,
    RecentSearches,
    HistoryRows,
}

impl Region {
    pub const ALL: [Region; 9] = [
        Region::ResultsSection,
        Region::SearchProgress,
        Region::SearchResults,
        Region::QuickSearchResults,
        Region::QuickLoading,
        Region::QuickResultsContainer,
        Region::DorkingOptions,
        Region::RecentSearches,
        Region::HistoryRows,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            Region::ResultsSection => "resultsSection",
            Region::SearchProgress => "searchProgress",
            Region::SearchResults => "searchResults",
            Region::QuickSearchResults => "quickSearchResults",
            Region::QuickLoading => "quickLoading",
            Region::QuickResultsContainer => "resultsContainer",
            Region::DorkingOptions => "dorkingOptions",
            Region::RecentSearches => "recentSearches",
            Region::HistoryRows => "historyTableBody",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Query,
    QuickQuery,
}

pub trait View {
    fn set_html(&self, region: Region, html: String);
    fn show(&self, region: Region);
    fn hide(&self, region: Region);
    fn animate(&self, region: Region, class: &str);
    fn set_submit_busy(&self, busy: bool);
    fn set_progress(&self, percent: u8);
    fn focus(&self, field: Field);
    fn notify(&self, notification: Notification);
    fn set_stat(&self, key: &str, value: String);
    fn select_search_type(&self, search_type: SearchType);
    fn reset_form(&self);
    fn close_modals(&self);
    fn navigate(&self, url: &str);
    fn copy_to_clipboard(&self, text: &str);
    fn apply_theme(&self, theme: Theme);
}

#[derive(Debug, Default, Clone)]
struct RegionState {
    html: String,
    visible: bool,
    animations: Vec<String>,
}

#[derive(Debug)]
struct PageState {
    title: String,
    csrf_token: Option<String>,
    regions: BTreeMap<Region, RegionState>,
    submit_busy: bool,
    progress: u8,
    focused: Option<Field>,
    notifications: NotificationCenter,
    stats: BTreeMap<String, String>,
    selected_type: Option<SearchType>,
    form_resets: usize,
    open_modals: usize,
    navigations: Vec<String>,
    clipboard: Option<String>,
    theme: Theme,
}

/// Single-threaded in-memory document.
#[derive(Debug)]
pub struct Page {
    state: RefCell<PageState>,
}

impl Default for Page {
    fn default() -> Self {
        Page::new("Dorkscope")
    }
}

impl Page {
    pub fn new(title: impl Into<String>) -> Page {
        Page {
            state: RefCell::new(PageState {
                title: title.into(),
                csrf_token: None,
                regions: BTreeMap::new(),
                submit_busy: false,
                progress: 0,
                focused: None,
                notifications: NotificationCenter::new(),
                stats: BTreeMap::new(),
                selected_type: None,
                form_resets: 0,
                open_modals: 0,
                navigations: Vec::new(),
                clipboard: None,
                theme: Theme::Light,
            }),
        }
    }

    /// Builds a page from a server-rendered template, picking up the title,
    /// the `csrf-token` meta tag and any `data-stat` fields.
    pub fn from_template(html: &str) -> Page {
        let document = Html::parse_document(html);
        let page = Page::default();

        if let Some(title) = select_first_text(&document, "title") {
            page.state.borrow_mut().title = title;
        }
        if let Ok(selector) = Selector::parse(r#"meta[name="csrf-token"]"#) {
            let token = document
                .select(&selector)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(str::to_string);
            page.state.borrow_mut().csrf_token = token;
        }
        if let Ok(selector) = Selector::parse("[data-stat]") {
            let mut state = page.state.borrow_mut();
            for element in document.select(&selector) {
                if let Some(key) = element.value().attr("data-stat") {
                    let text = element.text().collect::<String>().trim().to_string();
                    state.stats.insert(key.to_string(), text);
                }
            }
        }
        page
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.state.borrow().csrf_token.clone()
    }

    pub fn html(&self, region: Region) -> String {
        self.state
            .borrow()
            .regions
            .get(&region)
            .map(|r| r.html.clone())
            .unwrap_or_default()
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.state
            .borrow()
            .regions
            .get(&region)
            .is_some_and(|r| r.visible)
    }

    pub fn animations(&self, region: Region) -> Vec<String> {
        self.state
            .borrow()
            .regions
            .get(&region)
            .map(|r| r.animations.clone())
            .unwrap_or_default()
    }

    pub fn submit_busy(&self) -> bool {
        self.state.borrow().submit_busy
    }

    pub fn submit_label(&self) -> &'static str {
        if self.submit_busy() {
            SUBMIT_BUSY_LABEL
        } else {
            SUBMIT_IDLE_LABEL
        }
    }

    pub fn progress(&self) -> u8 {
        self.state.borrow().progress
    }

    pub fn focused(&self) -> Option<Field> {
        self.state.borrow().focused
    }

    /// Every notification emitted so far, expired or not.
    pub fn notifications(&self) -> Vec<(NotificationKind, String)> {
        self.state.borrow().notifications.history().to_vec()
    }

    pub fn last_notification(&self) -> Option<(NotificationKind, String)> {
        self.state.borrow().notifications.history().last().cloned()
    }

    pub fn stat(&self, key: &str) -> Option<String> {
        self.state.borrow().stats.get(key).cloned()
    }

    pub fn selected_search_type(&self) -> Option<SearchType> {
        self.state.borrow().selected_type.clone()
    }

    pub fn form_resets(&self) -> usize {
        self.state.borrow().form_resets
    }

    pub fn open_modal(&self) {
        self.state.borrow_mut().open_modals += 1;
    }

    pub fn open_modals(&self) -> usize {
        self.state.borrow().open_modals
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.borrow().navigations.clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state.borrow().clipboard.clone()
    }

    pub fn theme(&self) -> Theme {
        self.state.borrow().theme
    }

    fn with_region(&self, region: Region, f: impl FnOnce(&mut RegionState)) {
        let mut state = self.state.borrow_mut();
        f(state.regions.entry(region).or_default());
    }

    /// Serializes the visible document. `extra` is appended inside `<body>`,
    /// used for chart scripts.
    pub fn to_html(&self, extra: &str) -> String {
        let mut state = self.state.borrow_mut();
        let toasts = state.notifications.render();
        let mut body = String::new();

        if !state.stats.is_empty() {
            body.push_str(r#"<div class="dashboard-stats">"#);
            for (key, value) in &state.stats {
                body.push_str(&format!(
                    r#"<span data-stat="{}">{}</span>"#,
                    escape_html(key),
                    escape_html(value)
                ));
            }
            body.push_str("</div>\n");
        }

        for region in Region::ALL {
            let Some(region_state) = state.regions.get(&region) else {
                continue;
            };
            let style = if region_state.visible {
                ""
            } else {
                r#" style="display:none""#
            };
            body.push_str(&format!(
                "<div id=\"{}\"{style}>{}</div>\n",
                region.element_id(),
                region_state.html
            ));
        }
        if region_progress_visible(&state) {
            body.push_str(&format!(
                r#"<div class="progress"><div class="progress-bar" style="width: {}%"></div></div>"#,
                state.progress
            ));
            body.push('\n');
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body data-theme=\"{theme}\">\n<div class=\"toasts\">{toasts}</div>\n{body}{extra}\n</body>\n</html>\n",
            title = escape_html(&state.title),
            theme = state.theme.as_str(),
        )
    }

    pub fn to_text(&self, width: usize) -> anyhow::Result<String> {
        let html = self.to_html("");
        Ok(html2text::from_read(html.as_bytes(), width)?)
    }
}

fn region_progress_visible(state: &PageState) -> bool {
    state
        .regions
        .get(&Region::SearchProgress)
        .is_some_and(|r| r.visible)
}

fn select_first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

impl View for Page {
    fn set_html(&self, region: Region, html: String) {
        self.with_region(region, |r| r.html = html);
    }

    fn show(&self, region: Region) {
        self.with_region(region, |r| r.visible = true);
    }

    fn hide(&self, region: Region) {
        self.with_region(region, |r| r.visible = false);
    }

    fn animate(&self, region: Region, class: &str) {
        self.with_region(region, |r| r.animations.push(class.to_string()));
    }

    fn set_submit_busy(&self, busy: bool) {
        self.state.borrow_mut().submit_busy = busy;
    }

    fn set_progress(&self, percent: u8) {
        self.state.borrow_mut().progress = percent.min(100);
    }

    fn focus(&self, field: Field) {
        self.state.borrow_mut().focused = Some(field);
    }

    fn notify(&self, notification: Notification) {
        self.state.borrow_mut().notifications.push(notification);
    }

    fn set_stat(&self, key: &str, value: String) {
        self.state.borrow_mut().stats.insert(key.to_string(), value);
    }

    fn select_search_type(&self, search_type: SearchType) {
        self.state.borrow_mut().selected_type = Some(search_type);
    }

    fn reset_form(&self) {
        let mut state = self.state.borrow_mut();
        state.form_resets += 1;
        state.selected_type = None;
        state.focused = None;
    }

    fn close_modals(&self) {
        self.state.borrow_mut().open_modals = 0;
    }

    fn navigate(&self, url: &str) {
        self.state.borrow_mut().navigations.push(url.to_string());
    }

    fn copy_to_clipboard(&self, text: &str) {
        self.state.borrow_mut().clipboard = Some(text.to_string());
    }

    fn apply_theme(&self, theme: Theme) {
        self.state.borrow_mut().theme = theme;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_provides_csrf_token_and_stats() {
        let page = Page::from_template(
            r#"<html><head><title>Panel</title><meta name="csrf-token" content="tok-1"></head>
            <body><span data-stat="total_searches"> 7 </span></body></html>"#,
        );
        assert_eq!(page.csrf_token().as_deref(), Some("tok-1"));
        assert_eq!(page.stat("total_searches").as_deref(), Some("7"));
    }

    #[test]
    fn hidden_regions_render_with_display_none() {
        let page = Page::default();
        page.set_html(Region::SearchResults, "<p>x</p>".to_string());
        page.hide(Region::SearchResults);
        let html = page.to_html("");
        assert!(html.contains(r#"<div id="searchResults" style="display:none"><p>x</p></div>"#));
    }
}
