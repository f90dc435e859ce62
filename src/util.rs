use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::render::escape_html;

const DISPLAY_FORMAT: &str = "%d %b %Y, %H:%M";

/// Accepts RFC 3339 plus the naive formats the backend database emits.
/// Naive values are taken as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Human readable date for cards and tables. Output is markup-safe.
pub fn format_date(input: &str) -> String {
    match parse_timestamp(input) {
        Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        None => escape_html(input),
    }
}

/// Cuts `text` to at most `max_chars` characters, appending `...` when it cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Collapses a burst of calls into the last one, fired `wait` after it.
/// Needs a running tokio runtime.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Debouncer {
        Debouncer {
            wait,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let wait = self.wait;
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            if generation.load(Ordering::SeqCst) == ticket {
                f();
            }
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// A saved preference wins over the system setting.
    pub fn resolve(saved: Option<&str>, system_prefers_dark: bool) -> Theme {
        match saved.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("dark") => Theme::Dark,
            Some("light") => Theme::Light,
            _ if system_prefers_dark => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}
