use std::future::Future;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;

use crate::data_models::SearchRequest;
use crate::error::{ClientError, Result};

pub mod models;

use models::{DashboardData, SearchResponse};

pub const SEARCH_PATH: &str = "/api/search";
pub const DASHBOARD_PATH: &str = "/api/dashboard-data";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// The backend as seen by the front end: two JSON endpoints.
///
/// Implementations report non-2xx statuses as [`ClientError::Http`]; the
/// `success` flag of the envelope is left for the caller to interpret.
pub trait SearchApi {
    fn search(&self, request: &SearchRequest) -> impl Future<Output = Result<SearchResponse>>;

    fn dashboard_data(&self) -> impl Future<Output = Result<DashboardData>>;
}

/// `reqwest` backed implementation talking to the real server.
#[derive(Debug, Clone)]
pub struct HttpSearchApi {
    client: reqwest::Client,
    base: Url,
    csrf_token: Option<String>,
}

impl HttpSearchApi {
    pub fn new(base_url: &str, csrf_token: Option<String>) -> Result<HttpSearchApi> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        Ok(HttpSearchApi {
            client: reqwest::Client::new(),
            base,
            csrf_token,
        })
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Resolves an absolute api path such as `/api/search` against the base url.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{path}: {e}")))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> Result<T> {
        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
            });
        }
        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl SearchApi for HttpSearchApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = self.endpoint(SEARCH_PATH)?;
        log::debug!("POST {url}");
        let res = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(CSRF_HEADER, self.csrf_token.as_deref().unwrap_or(""))
            .json(request)
            .send()
            .await?;
        Self::read_json(res).await
    }

    async fn dashboard_data(&self) -> Result<DashboardData> {
        let url = self.endpoint(DASHBOARD_PATH)?;
        log::debug!("GET {url}");
        let res = self.client.get(url).send().await?;
        Self::read_json(res).await
    }
}
