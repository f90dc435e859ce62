use std::collections::BTreeMap;

use serde_json::Value;

use crate::api::SearchApi;
use crate::api::models::{ChartData, DashboardData, RecentSearch};
use crate::charts::{
    ChartBackend, ChartRegistry, ChartSlot, search_types_chart, sources_chart, timeline_chart,
};
use crate::render::render_recent_searches;
use crate::view::{Region, View};

/// Numeric fields on the dashboard that are refreshed in place.
pub const STAT_KEYS: [&str; 4] = ["total_searches", "avg_results", "max_results", "total_sources"];

pub struct DashboardUpdater<B: ChartBackend> {
    charts: ChartRegistry<B>,
}

fn stat_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl<B: ChartBackend> DashboardUpdater<B> {
    pub fn new(backend: B) -> Self {
        DashboardUpdater {
            charts: ChartRegistry::new(backend),
        }
    }

    pub fn charts(&self) -> &ChartRegistry<B> {
        &self.charts
    }

    /// Fetches `/api/dashboard-data` and applies it. Failures are logged and
    /// otherwise ignored; returns whether anything was applied.
    pub async fn refresh<A: SearchApi, V: View>(&self, api: &A, view: &V) -> bool {
        match api.dashboard_data().await {
            Ok(data) if data.success => {
                self.apply(view, &data);
                true
            }
            Ok(_) => {
                log::warn!("dashboard data request was not successful");
                false
            }
            Err(e) => {
                log::error!("error loading dashboard data: {e:#}");
                false
            }
        }
    }

    pub fn apply<V: View>(&self, view: &V, data: &DashboardData) {
        if let Some(stats) = &data.stats {
            update_stats(view, stats);
        }
        if let Some(charts) = &data.charts {
            self.update_charts(charts);
        }
        if let Some(recent) = &data.recent_searches {
            update_recent_searches(view, recent);
        }
    }

    /// Slots without a series keep whatever chart they had.
    pub fn update_charts(&self, data: &ChartData) {
        if let Some(series) = &data.search_types {
            self.charts
                .create_or_replace(ChartSlot::SearchTypes, &search_types_chart(series));
        }
        if let Some(series) = &data.sources_usage {
            self.charts
                .create_or_replace(ChartSlot::Sources, &sources_chart(series));
        }
        if let Some(series) = &data.timeline {
            self.charts
                .create_or_replace(ChartSlot::Timeline, &timeline_chart(series));
        }
    }

    pub fn resize(&self) {
        self.charts.resize_all();
    }
}

pub fn update_stats<V: View>(view: &V, stats: &BTreeMap<String, Value>) {
    for key in STAT_KEYS {
        if let Some(text) = stats.get(key).and_then(stat_text) {
            view.set_stat(key, text);
        }
    }
}

pub fn update_recent_searches<V: View>(view: &V, searches: &[RecentSearch]) {
    view.set_html(Region::RecentSearches, render_recent_searches(searches));
    view.show(Region::RecentSearches);
}
