#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::Notify;

use dorkscope::api::SearchApi;
use dorkscope::api::models::{DashboardData, SearchId, SearchResponse};
use dorkscope::controller::ControllerSettings;
use dorkscope::data_models::{RiskLevel, SearchRequest, SearchResult, Source};
use dorkscope::error::Result;
use dorkscope::form::FormFields;

/// In-process backend. Replies are served in order; once they run out every
/// search succeeds with no results.
#[derive(Default)]
pub struct FakeApi {
    replies: RefCell<VecDeque<Result<SearchResponse>>>,
    dashboard: RefCell<Option<DashboardData>>,
    gate: Option<Rc<Notify>>,
    calls: Cell<usize>,
    dashboard_calls: Cell<usize>,
    requests: RefCell<Vec<SearchRequest>>,
}

impl FakeApi {
    pub fn new() -> FakeApi {
        FakeApi::default()
    }

    /// Every search waits for a `notify_one` on `gate` before replying.
    pub fn gated(gate: Rc<Notify>) -> FakeApi {
        FakeApi {
            gate: Some(gate),
            ..FakeApi::default()
        }
    }

    pub fn reply(self, reply: Result<SearchResponse>) -> FakeApi {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    pub fn dashboard(self, data: DashboardData) -> FakeApi {
        *self.dashboard.borrow_mut() = Some(data);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn dashboard_calls(&self) -> usize {
        self.dashboard_calls.get()
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.borrow().clone()
    }
}

impl SearchApi for FakeApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let reply = self.replies.borrow_mut().pop_front();
        reply.unwrap_or_else(|| {
            Ok(SearchResponse {
                success: true,
                ..SearchResponse::default()
            })
        })
    }

    async fn dashboard_data(&self) -> Result<DashboardData> {
        self.dashboard_calls.set(self.dashboard_calls.get() + 1);
        Ok(self.dashboard.borrow().clone().unwrap_or_default())
    }
}

pub fn settings(route: &str) -> ControllerSettings {
    ControllerSettings {
        route: route.to_string(),
        dashboard_refresh_delay: Duration::from_millis(10),
        ..ControllerSettings::default()
    }
}

pub fn form(query: &str) -> FormFields {
    FormFields::from_pairs([
        ("query", query),
        ("search_type", "general"),
        ("max_results", "25"),
    ])
}

pub fn result(title: &str, source: Source, risk: Option<RiskLevel>) -> SearchResult {
    SearchResult {
        risk_level: risk,
        relevance_score: Some(0.5),
        ..SearchResult::new(title, "https://example.com/page", source)
    }
}

pub fn success(results: Vec<SearchResult>) -> SearchResponse {
    SearchResponse {
        success: true,
        results: Some(results),
        search_id: Some(SearchId::Number(42)),
        query: Some("example.com".to_string()),
        ..SearchResponse::default()
    }
}

pub async fn wait_until(mut ready: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if ready() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached in time");
}
