//! Client-side filtering and sorting of the server-rendered history table.
//!
//! Rows are never copied out into a separate model of their own: filtering
//! only flips visibility and sorting only reorders, like toggling `display`
//! and re-appending `<tr>` nodes would.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

use crate::error::{ClientError, Result};
use crate::render::escape_html;
use crate::util::parse_timestamp;

const ROW_SELECTOR: &str = "#historyTable tbody tr";
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    attrs: Vec<(String, String)>,
    inner_html: String,
    text: String,
    cells: Vec<String>,
    pub visible: bool,
    pub selected: bool,
}

impl HistoryRow {
    fn from_element(row: ElementRef<'_>, cell_selector: &Selector, check_selector: &Selector) -> Self {
        let attrs = row
            .value()
            .attrs()
            .filter(|(name, _)| *name != "style")
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let cells = row
            .select(cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        let selected = row
            .select(check_selector)
            .next()
            .is_some_and(|input| input.value().attr("checked").is_some());
        let hidden = row
            .value()
            .attr("style")
            .is_some_and(|style| style.replace(' ', "").contains("display:none"));

        HistoryRow {
            attrs,
            inner_html: row.inner_html(),
            text: row.text().collect(),
            cells,
            visible: !hidden,
            selected,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn search_type(&self) -> Option<&str> {
        self.attr("data-type")
    }

    pub fn status(&self) -> Option<&str> {
        self.attr("data-status")
    }

    pub fn date(&self) -> Option<&str> {
        self.attr("data-date")
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn render(&self) -> String {
        let mut html = String::from("<tr");
        for (name, value) in &self.attrs {
            html.push_str(&format!(r#" {}="{}""#, name, escape_html(value)));
        }
        if !self.visible {
            html.push_str(r#" style="display:none""#);
        }
        html.push('>');
        html.push_str(&self.inner_html);
        html.push_str("</tr>");
        html
    }
}

/// Active filters; `None` means the filter is off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub search_type: Option<String>,
    pub status: Option<String>,
    pub within_days: Option<u32>,
    pub query: Option<String>,
}

impl HistoryFilter {
    /// Builds a filter from the raw control values, where empty means off.
    pub fn from_inputs(search_type: &str, status: &str, days: &str, query: &str) -> Self {
        let on = |v: &str| (!v.trim().is_empty()).then(|| v.trim().to_string());
        HistoryFilter {
            search_type: on(search_type),
            status: on(status),
            within_days: days.trim().parse().ok(),
            query: on(query),
        }
    }

    pub fn matches(&self, row: &HistoryRow, now: DateTime<Utc>) -> bool {
        if let Some(kind) = &self.search_type {
            if row.search_type() != Some(kind.as_str()) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if row.status() != Some(status.as_str()) {
                return false;
            }
        }
        if let Some(days) = self.within_days {
            if !row.date().is_some_and(|d| is_within_days(d, days, now)) {
                return false;
            }
        }
        if let Some(query) = &self.query {
            if !row.text.to_lowercase().contains(&query.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Whole days between `date` and `now`, rounded up, compared against `days`.
/// Dates that cannot be parsed never match.
pub fn is_within_days(date: &str, days: u32, now: DateTime<Utc>) -> bool {
    let Some(when) = parse_timestamp(date) else {
        return false;
    };
    let diff_ms = (now - when).num_milliseconds().abs();
    let diff_days = (diff_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    diff_days <= i64::from(days)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTable {
    rows: Vec<HistoryRow>,
}

impl HistoryTable {
    /// Reads the rows of `#historyTable` out of a full page.
    pub fn parse(html: &str) -> Result<HistoryTable> {
        let document = Html::parse_document(html);
        let table = selector("#historyTable")?;
        if document.select(&table).next().is_none() {
            return Err(ClientError::History("page has no #historyTable".to_string()));
        }
        let rows = selector(ROW_SELECTOR)?;
        let cells = selector("td, th")?;
        let checks = selector("input.row-select")?;

        Ok(HistoryTable {
            rows: document
                .select(&rows)
                .map(|row| HistoryRow::from_element(row, &cells, &checks))
                .collect(),
        })
    }

    /// Same as [`parse`](Self::parse) for a bare run of `<tr>` elements.
    pub fn from_rows(rows_html: &str) -> Result<HistoryTable> {
        Self::parse(&format!(
            r#"<table id="historyTable"><tbody>{rows_html}</tbody></table>"#
        ))
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &HistoryRow> {
        self.rows.iter().filter(|r| r.visible)
    }

    /// Shows exactly the rows matching every active filter. Returns how many
    /// are visible afterwards.
    pub fn apply_filter(&mut self, filter: &HistoryFilter, now: DateTime<Utc>) -> usize {
        for row in &mut self.rows {
            row.visible = filter.matches(row, now);
        }
        self.visible_rows().count()
    }

    /// Ascending by the trimmed text of `column`; rows without that column
    /// compare as empty.
    pub fn sort_by_column(&mut self, column: usize) {
        self.rows
            .sort_by(|a, b| a.cell(column).unwrap_or("").cmp(b.cell(column).unwrap_or("")));
    }

    pub fn toggle_select_all(&mut self, checked: bool) {
        for row in &mut self.rows {
            row.selected = checked;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|r| r.selected).count()
    }

    pub fn render_rows(&self) -> String {
        self.rows
            .iter()
            .map(HistoryRow::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ClientError::History(format!("bad selector {css}: {e:?}")))
}
