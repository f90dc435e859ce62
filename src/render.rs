//! Markup builders for the results panes.
//!
//! Every function here is pure: results in, HTML string out. Anything that
//! came from the server or the user goes through [`escape_html`]; only the
//! fixed badge/label constants are written raw.

use crate::api::models::RecentSearch;
use crate::data_models::{ResultStats, RiskLevel, SearchResult, Source};
use crate::util::{format_date, truncate_text};

pub const QUICK_RESULTS_LIMIT: usize = 5;
pub const QUICK_DESCRIPTION_CHARS: usize = 100;

/// Escapes `& < > " '` so the result is safe both as element text and
/// inside a quoted attribute.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Only http(s) targets become links; anything else points nowhere.
pub fn safe_href(url: &str) -> String {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        escape_html(trimmed)
    } else {
        "#".to_string()
    }
}

pub fn risk_class(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "high-risk",
        RiskLevel::Medium => "medium-risk",
        RiskLevel::Low => "low-risk",
        RiskLevel::Unclassified => "",
    }
}

pub fn risk_badge(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => {
            r#"<span class="badge bg-danger"><i class="fas fa-exclamation-triangle"></i> High Risk</span>"#
        }
        RiskLevel::Medium => {
            r#"<span class="badge bg-warning text-dark"><i class="fas fa-exclamation-circle"></i> Medium Risk</span>"#
        }
        RiskLevel::Low => {
            r#"<span class="badge bg-success"><i class="fas fa-check-circle"></i> Low Risk</span>"#
        }
        RiskLevel::Unclassified => r#"<span class="badge bg-secondary">Unclassified</span>"#,
    }
}

pub fn source_badge(source: &Source) -> String {
    let fixed = match source {
        Source::Google => r#"<span class="badge bg-primary"><i class="fab fa-google"></i> Google</span>"#,
        Source::Bing => r#"<span class="badge bg-info"><i class="fab fa-microsoft"></i> Bing</span>"#,
        Source::DuckDuckGo => {
            r#"<span class="badge bg-success"><i class="fas fa-search"></i> DuckDuckGo</span>"#
        }
        Source::GoogleDork => {
            r#"<span class="badge bg-warning text-dark"><i class="fas fa-robot"></i> Google Dork</span>"#
        }
        Source::DomainAnalysis => {
            r#"<span class="badge bg-secondary"><i class="fas fa-globe"></i> Domain Analysis</span>"#
        }
        Source::IpAnalysis => {
            r#"<span class="badge bg-dark"><i class="fas fa-server"></i> IP Analysis</span>"#
        }
        Source::Other(raw) => {
            return format!(
                r#"<span class="badge bg-light text-dark">{}</span>"#,
                escape_html(raw)
            );
        }
    };
    fixed.to_string()
}

fn stat_card(value: usize, label: &str, class: &str) -> String {
    format!(
        r#"<div class="col-md-3"><div class="card text-center {class}"><div class="card-body"><h3 class="display-6">{value}</h3><p class="card-text">{label}</p></div></div></div>"#
    )
}

pub fn render_stats(stats: &ResultStats) -> String {
    let mut html = String::from(r#"<div class="row mb-4 result-stats">"#);
    html.push_str(&stat_card(stats.total, "Total Results", "bg-primary text-white"));
    html.push_str(&stat_card(stats.high_risk, "High Risk", "bg-danger text-white"));
    html.push_str(&stat_card(stats.medium_risk, "Medium Risk", "bg-warning text-dark"));
    html.push_str(&stat_card(stats.low_risk, "Low Risk", "bg-success text-white"));
    html.push_str("</div>\n");

    html.push_str(&format!(
        r#"<div class="d-flex justify-content-between align-items-center mb-3"><h5><i class="fas fa-list"></i> Detailed Results</h5><small class="text-muted">{} sources, average relevance {:.1}%</small>"#,
        stats.sources.len(),
        stats.avg_relevance * 100.0
    ));
    html.push_str(r#"<div class="btn-group" role="group">"#);
    for (format, icon, label) in [
        ("excel", "fa-file-excel", "Excel"),
        ("pdf", "fa-file-pdf", "PDF"),
        ("csv", "fa-file-csv", "CSV"),
    ] {
        html.push_str(&format!(
            r#"<button type="button" class="btn btn-outline-primary btn-sm" data-export="{format}"><i class="fas {icon}"></i> {label}</button>"#
        ));
    }
    html.push_str("</div></div>\n");
    html
}

/// Missing or blank titles read as `Untitled`.
fn display_title(result: &SearchResult) -> &str {
    result
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Untitled")
}

pub fn render_result_card(result: &SearchResult, index: usize) -> String {
    let risk = result.risk();
    let url = result.url.as_deref().unwrap_or("");
    let title = display_title(result);

    let mut html = format!(
        r#"<div class="card mb-3 result-card {class}" data-index="{index}"><div class="card-body">"#,
        class = risk_class(risk),
    );
    html.push_str(&format!(
        r#"<div class="d-flex justify-content-between align-items-start mb-2"><h6 class="card-title mb-0"><a href="{href}" target="_blank" rel="noopener noreferrer" class="text-decoration-none">{title} <i class="fas fa-external-link-alt ms-1"></i></a></h6><div class="badges">{source} {risk}</div></div>"#,
        href = safe_href(url),
        title = escape_html(title),
        source = source_badge(&result.source),
        risk = risk_badge(risk),
    ));
    html.push_str(&format!(
        r#"<p class="card-text text-muted small mb-2"><i class="fas fa-link"></i> {}</p>"#,
        escape_html(url)
    ));
    if let Some(description) = result.description.as_deref().filter(|d| !d.is_empty()) {
        html.push_str(&format!(
            r#"<p class="card-text">{}</p>"#,
            escape_html(description)
        ));
    }

    html.push_str(r#"<div class="result-meta">"#);
    if let Some(dork) = result.dork_used.as_deref().filter(|d| !d.is_empty()) {
        html.push_str(&format!(
            r#"<small class="text-muted"><strong><i class="fas fa-search"></i> Dork:</strong> <code>{}</code></small>"#,
            escape_html(dork)
        ));
    }
    if let Some(score) = result.relevance_score.filter(|s| *s > 0.0) {
        html.push_str(&format!(
            r#"<small class="text-muted ms-3"><strong><i class="fas fa-star"></i> Relevance:</strong> {:.1}%</small>"#,
            score * 100.0
        ));
    }
    if let Some(ts) = result.timestamp.as_deref() {
        html.push_str(&format!(
            r#"<small class="result-date ms-3">{}</small>"#,
            format_date(ts)
        ));
    }
    html.push_str("</div>");

    html.push_str(&format!(
        r#"<div class="result-actions"><button class="btn btn-sm btn-outline-primary" data-action="save" data-index="{index}"><i class="fas fa-bookmark"></i> Save</button> <button class="btn btn-sm btn-outline-secondary" data-action="share" data-index="{index}"><i class="fas fa-share"></i> Share</button> <button class="btn btn-sm btn-outline-info" data-action="analyze" data-index="{index}"><i class="fas fa-microscope"></i> Analyze</button></div>"#
    ));
    html.push_str("</div></div>\n");
    html
}

pub fn render_empty_results() -> String {
    r#"<div class="alert alert-info text-center empty-results"><i class="fas fa-info-circle fa-2x mb-3"></i><h5>No results found</h5><p class="mb-0">Try different search terms or enable Google Dorking for a more thorough search.</p></div>"#
        .to_string()
}

/// Stats block followed by one card per result, or the empty-state panel.
pub fn render_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return render_empty_results();
    }
    let stats = ResultStats::from_results(results);
    let mut html = render_stats(&stats);
    html.push_str(r#"<div class="results-grid">"#);
    for (index, result) in results.iter().enumerate() {
        html.push_str(&render_result_card(result, index));
    }
    html.push_str("</div>");
    html
}

pub fn render_results_header(
    query: &str,
    search_type: &str,
    count: usize,
    search_id: Option<&str>,
) -> String {
    let id = search_id
        .map(|id| format!(r#"<span class="badge bg-secondary">ID: {}</span>"#, escape_html(id)))
        .unwrap_or_default();
    format!(
        r#"<div class="search-results-header"><h3><i class="fas fa-search"></i> Results for "{query}"</h3><div class="search-meta"><span class="badge bg-info">Type: {search_type}</span> <span class="badge bg-success">{count} results</span> {id}</div></div>"#,
        query = escape_html(query),
        search_type = escape_html(search_type),
    )
}

pub fn render_error_panel(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger search-error"><i class="fas fa-exclamation-triangle"></i> <strong>Search error:</strong> {}<hr><p class="mb-0"><small>Check your connection and make sure the search parameters are correct.</small></p></div>"#,
        escape_html(message)
    )
}

pub fn render_quick_error(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger"><i class="fas fa-exclamation-triangle"></i> Error: {}</div>"#,
        escape_html(message)
    )
}

/// Preview of at most five results with a link to the full results page.
pub fn render_quick_results(results: &[SearchResult], query: &str) -> String {
    let mut html = format!(
        r#"<div class="quick-results-header"><h4><i class="fas fa-bolt"></i> Quick results for "{}"</h4><span class="badge bg-success">{} results</span></div>"#,
        escape_html(query),
        results.len()
    );

    if results.is_empty() {
        html.push_str(r#"<div class="alert alert-info"><i class="fas fa-info-circle"></i> No results were found for this search.</div>"#);
        return html;
    }

    html.push_str(r#"<div class="quick-results-list">"#);
    for result in results.iter().take(QUICK_RESULTS_LIMIT) {
        let title = display_title(result);
        let description = result.description.as_deref().unwrap_or("");
        html.push_str(&format!(
            r#"<div class="quick-result-item"><h6><a href="{href}" target="_blank" rel="noopener noreferrer">{title}</a></h6><p class="quick-result-description">{description}</p><small class="text-muted"><i class="fas fa-globe"></i> {source}</small></div>"#,
            href = safe_href(result.url.as_deref().unwrap_or("")),
            title = escape_html(title),
            description = escape_html(&truncate_text(description, QUICK_DESCRIPTION_CHARS)),
            source = escape_html(result.source.as_str()),
        ));
    }
    html.push_str("</div>");

    if results.len() > QUICK_RESULTS_LIMIT {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        html.push_str(&format!(
            r#"<div class="quick-results-more"><a href="/search?query={encoded}" class="btn btn-primary"><i class="fas fa-search-plus"></i> View all results ({})</a></div>"#,
            results.len()
        ));
    }
    html
}

/// Rows in the same shape as the server-rendered history table.
pub fn render_recent_searches(searches: &[RecentSearch]) -> String {
    let mut html = String::new();
    for search in searches {
        let date = search.timestamp.as_deref().unwrap_or("");
        let status = search.status.as_deref().unwrap_or("completed");
        html.push_str(&format!(
            r#"<tr data-type="{kind}" data-status="{status}" data-date="{date}"><td>{query}</td><td>{kind}</td><td>{when}</td><td>{count}</td><td>{status}</td></tr>"#,
            kind = escape_html(search.search_type.as_str()),
            status = escape_html(status),
            date = escape_html(date),
            query = escape_html(&search.query),
            when = format_date(date),
            count = search.results_count.unwrap_or(0),
        ));
        html.push('\n');
    }
    html
}

#[test]
fn test_escape_html_handles_all_specials() {
    assert_eq!(escape_html("<b>"), "&lt;b&gt;");
    let escaped = escape_html(r#"a&"b'"#);
    assert!(escaped.starts_with("a&amp;&quot;b&"));
    assert!(!escaped.contains('\''));
    assert_eq!(escape_html("plain text"), "plain text");
}

#[test]
fn test_safe_href_rejects_script_urls() {
    assert_eq!(safe_href("javascript:alert(1)"), "#");
    assert_eq!(safe_href("HTTPS://x.test/?a=1&b=2"), "HTTPS://x.test/?a=1&amp;b=2");
}
