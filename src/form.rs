use std::collections::BTreeSet;

use crate::data_models::{DEFAULT_DORK_CATEGORY, SearchRequest, SearchType};
use crate::error::ValidationError;

pub const MIN_QUERY_CHARS: usize = 2;

const COMPANY_MARKERS: [&str; 5] = ["corp", "inc", "ltd", "s.a", "empresa"];

/// Raw values of the search form, as the browser would submit them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub query: String,
    pub search_type: String,
    /// Checkbox value; `"on"` when ticked.
    pub enable_dorking: Option<String>,
    pub dork_categories: Vec<String>,
    pub max_results: String,
    pub language: String,
    pub date_range: String,
    pub risk_filter: String,
}

impl FormFields {
    /// Collects fields from `name=value` pairs. Repeated `dork_categories`
    /// entries accumulate, every other field keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> FormFields
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut fields = FormFields::default();
        for (name, value) in pairs {
            let value = value.into();
            match name.as_ref() {
                "query" => fields.query = value,
                "search_type" => fields.search_type = value,
                "enable_dorking" => fields.enable_dorking = Some(value),
                "dork_categories" => fields.dork_categories.push(value),
                "max_results" => fields.max_results = value,
                "language" => fields.language = value,
                "date_range" => fields.date_range = value,
                "risk_filter" => fields.risk_filter = value,
                other => log::debug!("ignoring unknown form field {other}"),
            }
        }
        fields
    }

    pub fn dorking_enabled(&self) -> bool {
        self.enable_dorking.as_deref() == Some("on")
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Reads the form into a request. Dorking without any ticked category falls
/// back to the `general` category.
pub fn prepare_search_data(fields: &FormFields) -> SearchRequest {
    let enable_dorking = fields.dorking_enabled();
    let dork_categories = enable_dorking.then(|| {
        let checked: BTreeSet<String> = fields
            .dork_categories
            .iter()
            .filter_map(|c| non_empty(c))
            .collect();
        if checked.is_empty() {
            BTreeSet::from([DEFAULT_DORK_CATEGORY.to_string()])
        } else {
            checked
        }
    });

    SearchRequest {
        query: fields.query.trim().to_string(),
        search_type: SearchType::from(fields.search_type.as_str()),
        enable_dorking,
        dork_categories,
        sources: None,
        max_results: fields.max_results.trim().parse().ok(),
        language: non_empty(&fields.language),
        date_range: non_empty(&fields.date_range),
        risk_filter: non_empty(&fields.risk_filter),
    }
}

/// Rules are checked in order and the first failure wins.
pub fn validate(request: &SearchRequest) -> Result<(), ValidationError> {
    if request.query.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    if request.query.chars().count() < MIN_QUERY_CHARS {
        return Err(ValidationError::QueryTooShort {
            min: MIN_QUERY_CHARS,
        });
    }
    if request.enable_dorking
        && request
            .dork_categories
            .as_ref()
            .is_none_or(|categories| categories.is_empty())
    {
        return Err(ValidationError::NoDorkCategories);
    }
    Ok(())
}

fn is_ipv4_shape(value: &str) -> bool {
    let groups: Vec<&str> = value.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Best-effort guess of the search type from free text. The server has the
/// final word; `None` means "leave the current selection alone".
pub fn detect_search_type(input: &str) -> Option<SearchType> {
    let value = input.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }

    if value.contains('@') && value.contains('.') {
        return Some(SearchType::Email);
    }
    if is_ipv4_shape(&value) {
        return Some(SearchType::Ip);
    }
    if value.contains('.') && !value.contains(' ') && value.chars().count() > 3 {
        return Some(SearchType::Domain);
    }
    if value.contains(' ') {
        if COMPANY_MARKERS.iter().any(|m| value.contains(m)) {
            return Some(SearchType::Company);
        }
        return Some(SearchType::Person);
    }
    None
}

#[test]
fn test_ipv4_shape() {
    assert!(is_ipv4_shape("10.0.0.1"));
    assert!(is_ipv4_shape("999.999.999.999"));
    assert!(!is_ipv4_shape("10.0.0"));
    assert!(!is_ipv4_shape("10.0.0.1234"));
    assert!(!is_ipv4_shape("10.a.0.1"));
    assert!(!is_ipv4_shape("10..0.1"));
}
