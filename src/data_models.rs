use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_DORK_CATEGORY: &str = "general";

/// Field reader for loosely typed backends: `null` or a value of the wrong
/// JSON type counts as absent instead of failing the whole payload.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchType {
    Email,
    Ip,
    Domain,
    Company,
    Person,
    General,
    Other(String),
}

impl SearchType {
    pub fn as_str(&self) -> &str {
        match self {
            SearchType::Email => "email",
            SearchType::Ip => "ip",
            SearchType::Domain => "domain",
            SearchType::Company => "company",
            SearchType::Person => "person",
            SearchType::General => "general",
            SearchType::Other(raw) => raw,
        }
    }
}

impl Default for SearchType {
    fn default() -> Self {
        SearchType::General
    }
}

impl From<String> for SearchType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "email" => SearchType::Email,
            "ip" => SearchType::Ip,
            "domain" => SearchType::Domain,
            "company" => SearchType::Company,
            "person" => SearchType::Person,
            "general" | "" => SearchType::General,
            _ => SearchType::Other(value),
        }
    }
}

impl From<&str> for SearchType {
    fn from(value: &str) -> Self {
        SearchType::from(value.to_string())
    }
}

impl From<SearchType> for String {
    fn from(value: SearchType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/search`. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub search_type: SearchType,
    #[serde(default)]
    pub enable_dorking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dork_categories: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_filter: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, search_type: SearchType) -> SearchRequest {
        SearchRequest {
            query: query.into(),
            search_type,
            enable_dorking: false,
            dork_categories: None,
            sources: None,
            max_results: None,
            language: None,
            date_range: None,
            risk_filter: None,
        }
    }

    /// The lighter request issued by the quick-search box.
    pub fn quick(query: impl Into<String>, search_type: SearchType) -> SearchRequest {
        SearchRequest {
            sources: Some(
                [Source::Google, Source::Bing, Source::DuckDuckGo]
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            ),
            max_results: Some(20),
            ..SearchRequest::new(query, search_type)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Google,
    Bing,
    DuckDuckGo,
    GoogleDork,
    DomainAnalysis,
    IpAnalysis,
    Other(String),
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Google => "google",
            Source::Bing => "bing",
            Source::DuckDuckGo => "duckduckgo",
            Source::GoogleDork => "google_dork",
            Source::DomainAnalysis => "domain_analysis",
            Source::IpAnalysis => "ip_analysis",
            Source::Other(raw) => raw,
        }
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        match value.as_str() {
            "google" => Source::Google,
            "bing" => Source::Bing,
            "duckduckgo" => Source::DuckDuckGo,
            "google_dork" => Source::GoogleDork,
            "domain_analysis" => Source::DomainAnalysis,
            "ip_analysis" => Source::IpAnalysis,
            _ if value.trim().is_empty() => Source::default(),
            _ => Source::Other(value),
        }
    }
}

impl From<Source> for String {
    fn from(value: Source) -> Self {
        value.as_str().to_string()
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Other("unknown".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, alias = "link", deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, alias = "snippet", deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub source: Source,
    #[serde(default, deserialize_with = "lenient")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, deserialize_with = "lenient")]
    pub relevance_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub dork_used: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: Source) -> SearchResult {
        SearchResult {
            title: Some(title.into()),
            url: Some(url.into()),
            description: None,
            source,
            risk_level: None,
            relevance_score: None,
            dork_used: None,
            timestamp: None,
        }
    }

    /// Missing levels count as unclassified.
    pub fn risk(&self) -> RiskLevel {
        self.risk_level.unwrap_or(RiskLevel::Unclassified)
    }
}

/// Summary numbers derived from a result list. Never stored on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultStats {
    pub total: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub sources: Vec<Source>,
    pub avg_relevance: f64,
}

impl ResultStats {
    pub fn from_results(results: &[SearchResult]) -> ResultStats {
        let count = |level: RiskLevel| results.iter().filter(|r| r.risk() == level).count();

        let mut sources: Vec<Source> = Vec::new();
        for result in results {
            if !sources.contains(&result.source) {
                sources.push(result.source.clone());
            }
        }

        let avg_relevance = if results.is_empty() {
            0.0
        } else {
            results
                .iter()
                .map(|r| r.relevance_score.unwrap_or(0.0))
                .sum::<f64>()
                / results.len() as f64
        };

        ResultStats {
            total: results.len(),
            high_risk: count(RiskLevel::High),
            medium_risk: count(RiskLevel::Medium),
            low_risk: count(RiskLevel::Low),
            sources,
            avg_relevance,
        }
    }

    pub fn classified(&self) -> usize {
        self.high_risk + self.medium_risk + self.low_risk
    }
}

#[test]
fn test_unknown_risk_level_is_unclassified() {
    let result: SearchResult =
        serde_json::from_str(r#"{"title":"t","url":"u","source":"x","risk_level":"critical"}"#)
            .unwrap();
    assert_eq!(result.risk(), RiskLevel::Unclassified);
    assert_eq!(result.source, Source::Other("x".to_string()));
}

#[test]
fn test_odd_field_types_do_not_reject_the_result() {
    let result: SearchResult = serde_json::from_str(
        r#"{"title":42,"url":"u","source":null,"risk_level":3,"relevance_score":"high"}"#,
    )
    .unwrap();
    assert_eq!(result.title, None);
    assert_eq!(result.source, Source::default());
    assert_eq!(result.risk(), RiskLevel::Unclassified);
    assert_eq!(result.relevance_score, None);

    let blank: SearchResult = serde_json::from_str(r#"{"source":"  "}"#).unwrap();
    assert_eq!(blank.source, Source::default());
}

#[test]
fn test_search_type_round_trips_known_and_custom_names() {
    assert_eq!(SearchType::from("IP"), SearchType::Ip);
    assert_eq!(String::from(SearchType::from("vehicle")), "vehicle");
}
