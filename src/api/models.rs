use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data_models::{SearchResult, SearchType, lenient, lenient_or_default};
use crate::error::ClientError;

/// Envelope returned by `POST /api/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
    #[serde(default)]
    pub search_id: Option<SearchId>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub search_type: Option<SearchType>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SearchResponse {
    /// Turns an application-level `success: false` into an error.
    pub fn into_result(self) -> Result<SearchResponse, ClientError> {
        if self.success {
            Ok(self)
        } else {
            Err(ClientError::from_envelope(self.error, self.message))
        }
    }
}

/// Backends hand out either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for SearchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchId::Number(n) => write!(f, "{n}"),
            SearchId::Text(s) => f.write_str(s),
        }
    }
}

/// Envelope returned by `GET /api/dashboard-data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    pub success: bool,
    #[serde(default)]
    pub stats: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub charts: Option<ChartData>,
    #[serde(default)]
    pub recent_searches: Option<Vec<RecentSearch>>,
}

/// Label -> count series; order follows the label ordering the server sent
/// after JSON object decoding, which is lexicographic here.
pub type Series = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub search_types: Option<Series>,
    #[serde(default)]
    pub sources_usage: Option<Series>,
    #[serde(default)]
    pub timeline: Option<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearch {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<SearchId>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub query: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub search_type: SearchType,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub results_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
}
