use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use dorkscope::api::{HttpSearchApi, SearchApi};
use dorkscope::controller::SearchController;
use dorkscope::data_models::{RiskLevel, SearchRequest, SearchType, Source};
use dorkscope::error::ClientError;
use dorkscope::view::{Page, Region};

mod common;

mod test_helpers {
    use super::*;

    pub const TOKEN: &str = "csrf-test-token";

    /// A batch where the second result carries nulls and wrong types.
    pub const LOOSE_SEARCH: &str = r#"{
        "success": true, "search_id": 5, "query": "example.com", "search_type": null,
        "results": [
            {"title": "Clean", "url": "https://a.example/", "source": "google", "risk_level": "low"},
            {"title": null, "url": "https://b.example/", "source": null, "risk_level": 3,
             "relevance_score": "0.7", "timestamp": 1709280000}
        ]
    }"#;

    pub const LOOSE_DASHBOARD: &str = r#"{
        "success": true,
        "recent_searches": [
            {"id": 1.5, "query": null, "search_type": null, "timestamp": "2024-03-02 09:15:00",
             "results_count": "8", "status": null},
            {"id": 2, "query": "example.com", "search_type": "domain"}
        ]
    }"#;

    /// Starts `router` on an ephemeral port and returns its base url.
    pub async fn spawn_backend(router: Router) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        Ok(format!("http://{addr}"))
    }

    async fn search(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let token = headers
            .get("X-CSRFToken")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if token != TOKEN {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({"success": false, "error": "CSRF token missing"})),
            );
        }
        let query = body["query"].as_str().unwrap_or("").to_string();
        if query == "explode" {
            return (
                StatusCode::OK,
                Json(json!({"success": false, "error": "<i>engine crashed</i>"})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "search_id": "s-77",
                "query": query,
                "search_type": body["search_type"],
                "results": [
                    {
                        "title": "Whois record",
                        "link": "https://whois.example/record",
                        "snippet": "Registrant details",
                        "source": "domain_analysis",
                        "risk_level": "medium",
                        "relevance_score": 0.9
                    },
                    {
                        "title": "Leaked file",
                        "url": "https://files.example/backup.sql",
                        "source": "google_dork",
                        "risk_level": "high",
                        "dork_used": "site:example.com ext:sql"
                    }
                ]
            })),
        )
    }

    async fn dashboard() -> Json<Value> {
        Json(json!({
            "success": true,
            "stats": {"total_searches": 12, "avg_results": 4.5, "max_results": 30, "total_sources": 6},
            "charts": {
                "search_types": {"domain": 7, "email": 5},
                "sources_usage": {"google": 10},
                "timeline": {"2024-03-01": 2, "2024-03-02": 4}
            },
            "recent_searches": [
                {"id": 3, "query": "example.com", "search_type": "domain",
                 "timestamp": "2024-03-02 09:15:00", "results_count": 8}
            ]
        }))
    }

    pub fn router() -> Router {
        Router::new()
            .route("/api/search", post(search))
            .route("/api/dashboard-data", get(dashboard))
            .route(
                "/broken/api/search",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/garbled/api/dashboard-data", get(|| async { "not json" }))
            .route(
                "/loose/api/search",
                post(|| async { Json(serde_json::from_str::<Value>(LOOSE_SEARCH).unwrap()) }),
            )
            .route(
                "/loose/api/dashboard-data",
                get(|| async { Json(serde_json::from_str::<Value>(LOOSE_DASHBOARD).unwrap()) }),
            )
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_search_sends_csrf_token_and_decodes_results() -> Result<()> {
    let base = spawn_backend(router()).await?;
    let api = HttpSearchApi::new(&base, Some(TOKEN.to_string()))?;

    let response = api
        .search(&SearchRequest::new("example.com", SearchType::Domain))
        .await?;
    assert!(response.success);
    assert_eq!(response.search_id.map(|id| id.to_string()).as_deref(), Some("s-77"));
    assert_eq!(response.search_type, Some(SearchType::Domain));

    let results = response.results.unwrap_or_default();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url.as_deref(), Some("https://whois.example/record"));
    assert_eq!(results[0].description.as_deref(), Some("Registrant details"));
    assert_eq!(results[0].source, Source::DomainAnalysis);
    assert_eq!(results[1].risk(), RiskLevel::High);
    Ok(())
}

#[tokio::test]
async fn test_missing_token_maps_status_to_http_error() -> Result<()> {
    let base = spawn_backend(router()).await?;
    let api = HttpSearchApi::new(&base, None)?;

    let err = api
        .search(&SearchRequest::new("example.com", SearchType::Domain))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 403 }));
    assert_eq!(err.user_message(), "HTTP error! status: 403");
    Ok(())
}

#[tokio::test]
async fn test_server_error_under_a_path_prefix() -> Result<()> {
    let base = spawn_backend(router()).await?;
    let api = HttpSearchApi::new(&format!("{base}/broken"), Some(TOKEN.to_string()))?;
    assert_eq!(
        api.endpoint("/api/search")?.as_str(),
        format!("{base}/broken/api/search")
    );

    let err = api
        .search(&SearchRequest::new("example.com", SearchType::Domain))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 500 }));
    Ok(())
}

#[tokio::test]
async fn test_dashboard_data_decodes() -> Result<()> {
    let base = spawn_backend(router()).await?;
    let api = HttpSearchApi::new(&base, None)?;

    let data = api.dashboard_data().await?;
    assert!(data.success);
    let charts = data.charts.unwrap_or_default();
    assert_eq!(
        charts.search_types.unwrap_or_default().get("domain"),
        Some(&7.0)
    );
    let recent = data.recent_searches.unwrap_or_default();
    assert_eq!(recent[0].search_type, SearchType::Domain);
    assert_eq!(recent[0].results_count, Some(8));
    Ok(())
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_error() -> Result<()> {
    let base = spawn_backend(router()).await?;
    let api = HttpSearchApi::new(&format!("{base}/garbled"), None)?;
    assert!(matches!(
        api.dashboard_data().await,
        Err(ClientError::Decode(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let api = HttpSearchApi::new(&format!("http://{addr}"), None)?;
    assert!(matches!(
        api.dashboard_data().await,
        Err(ClientError::Transport(_))
    ));
    Ok(())
}

#[test]
fn test_rejects_malformed_base_url() {
    assert!(matches!(
        HttpSearchApi::new("not a url", None),
        Err(ClientError::InvalidBaseUrl(_))
    ));
}

#[tokio::test]
async fn test_controller_over_http_escapes_application_error() -> Result<()> {
    let base = spawn_backend(router()).await?;
    let api = HttpSearchApi::new(&base, Some(TOKEN.to_string()))?;
    let controller = SearchController::new(api, Page::default(), common::settings("/search"));

    assert!(controller.submit(&common::form("explode")).await.is_err());
    let html = controller.view().html(Region::SearchResults);
    assert!(html.contains("&lt;i&gt;engine crashed&lt;/i&gt;"));

    let summary = controller.submit(&common::form("example.com")).await?;
    assert_eq!(summary.result_count, 2);
    assert_eq!(summary.search_id.as_deref(), Some("s-77"));
    let html = controller.view().html(Region::SearchResults);
    assert!(html.contains("Google Dork"));
    assert!(html.contains("site:example.com ext:sql"));
    Ok(())
}

mod loose_payloads {
    use super::*;
    use dorkscope::api::models::{DashboardData, SearchResponse};
    use dorkscope::render::render_results;

    #[test]
    fn test_nulls_and_wrong_types_keep_the_batch() -> Result<()> {
        let response: SearchResponse = serde_json::from_str(LOOSE_SEARCH)?;
        assert_eq!(response.search_type, None);

        let results = response.results.unwrap_or_default();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].title, None);
        assert_eq!(results[1].source, Source::default());
        assert_eq!(results[1].risk(), RiskLevel::Unclassified);
        assert_eq!(results[1].relevance_score, None);
        assert_eq!(results[1].timestamp, None);

        let html = render_results(&results);
        assert_eq!(html.matches(r#"class="card mb-3 result-card"#).count(), 2);
        assert!(html.contains("Untitled"));
        assert!(html.contains("unknown"));
        Ok(())
    }

    #[test]
    fn test_recent_search_rows_with_nulls_still_decode() -> Result<()> {
        let data: DashboardData = serde_json::from_str(LOOSE_DASHBOARD)?;
        let recent = data.recent_searches.unwrap_or_default();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, None);
        assert_eq!(recent[0].query, "");
        assert_eq!(recent[0].search_type, SearchType::General);
        assert_eq!(recent[0].results_count, None);
        assert_eq!(recent[1].search_type, SearchType::Domain);
        Ok(())
    }

    #[tokio::test]
    async fn test_controller_renders_loose_batch_over_http() -> Result<()> {
        let base = spawn_backend(router()).await?;
        let api = HttpSearchApi::new(&format!("{base}/loose"), Some(TOKEN.to_string()))?;
        let controller = SearchController::new(api, Page::default(), common::settings("/search"));

        let summary = controller.submit(&common::form("example.com")).await?;
        assert_eq!(summary.result_count, 2);
        let html = controller.view().html(Region::SearchResults);
        assert!(!html.contains("search-error"));
        assert!(html.contains("Type: general"));

        let data = controller.api().dashboard_data().await?;
        assert_eq!(data.recent_searches.map(|r| r.len()), Some(2));
        Ok(())
    }
}
