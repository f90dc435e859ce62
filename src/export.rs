use std::fmt;
use std::str::FromStr;

use crate::api::SearchApi;
use crate::controller::SearchController;
use crate::error::{ClientError, Result};
use crate::notify::Notification;
use crate::view::View;

pub const EXPORT_HISTORY_PATH: &str = "/api/export/history";
pub const EXPORT_RESULTS_PATH: &str = "/api/export/results";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

pub fn results_export_path(search_id: &str, format: Option<ExportFormat>) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(search_id.as_bytes()).collect();
    match format {
        Some(format) => format!("{EXPORT_RESULTS_PATH}/{encoded}?format={format}"),
        None => format!("{EXPORT_RESULTS_PATH}/{encoded}"),
    }
}

/// Exports and per-result actions. Exports are full-page navigations, the
/// server streams the file.
impl<A: SearchApi, V: View> SearchController<A, V> {
    pub fn export_history(&self) {
        self.notify(Notification::info("Exporting history..."));
        log::info!("navigating to {EXPORT_HISTORY_PATH}");
        self.view().navigate(EXPORT_HISTORY_PATH);
    }

    pub fn export_results(&self, format: Option<ExportFormat>) -> Result<String> {
        let Some(search_id) = self.session().current_search_id() else {
            let err = ClientError::NothingToExport;
            self.notify(Notification::warning(err.user_message()));
            return Err(err);
        };
        let path = results_export_path(&search_id, format);
        let label = format.map(|f| f.as_str().to_uppercase());
        self.notify(Notification::info(match label {
            Some(label) => format!("Exporting results as {label}..."),
            None => "Exporting results...".to_string(),
        }));
        log::info!("navigating to {path}");
        self.view().navigate(&path);
        Ok(path)
    }

    pub fn save_result(&self, index: usize) -> bool {
        if self.session().result(index).is_none() {
            return false;
        }
        self.notify(Notification::success("Result saved"));
        true
    }

    /// Copies the result url to the clipboard.
    pub fn share_result(&self, index: usize) -> bool {
        let Some(result) = self.session().result(index) else {
            return false;
        };
        let url = result.url.unwrap_or_default();
        self.view().copy_to_clipboard(&url);
        self.notify(Notification::success("URL copied to clipboard"));
        true
    }

    pub fn analyze_result(&self, index: usize) -> bool {
        if self.session().result(index).is_none() {
            return false;
        }
        self.notify(Notification::info("Analyzing result..."));
        true
    }
}

#[test]
fn test_results_export_path_encodes_id() {
    assert_eq!(results_export_path("42", None), "/api/export/results/42");
    assert_eq!(
        results_export_path("a b", Some(ExportFormat::Csv)),
        "/api/export/results/a+b?format=csv"
    );
}
