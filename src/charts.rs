//! Dashboard charts behind a pluggable rendering port.
//!
//! A slot holds at most one live chart. [`ChartRegistry::create_or_replace`]
//! always destroys the previous instance of a slot before the backend is
//! asked for a new one.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Value, json};

use crate::api::models::Series;

const PALETTE: [&str; 6] = [
    "#3498db", "#e74c3c", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChartSlot {
    SearchTypes,
    Sources,
    Timeline,
}

impl ChartSlot {
    pub fn canvas_id(self) -> &'static str {
        match self {
            ChartSlot::SearchTypes => "searchTypesChart",
            ChartSlot::Sources => "sourcesChart",
            ChartSlot::Timeline => "timelineChart",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Doughnut,
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub background_color: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    pub border_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// Serializes to the shape Chart.js expects for `new Chart(ctx, config)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: Value,
}

fn split_series(series: &Series) -> (Vec<String>, Vec<f64>) {
    series.iter().map(|(k, v)| (k.clone(), *v)).unzip()
}

pub fn search_types_chart(series: &Series) -> ChartConfig {
    let (labels, data) = split_series(series);
    ChartConfig {
        kind: ChartKind::Doughnut,
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: None,
                data,
                background_color: json!(PALETTE),
                border_color: Some("#fff".to_string()),
                border_width: 2,
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": {
                "legend": {
                    "position": "bottom",
                    "labels": { "padding": 20, "usePointStyle": true }
                }
            },
            "animation": { "animateScale": true, "animateRotate": true }
        }),
    }
}

pub fn sources_chart(series: &Series) -> ChartConfig {
    let (labels, data) = split_series(series);
    ChartConfig {
        kind: ChartKind::Bar,
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: Some("Queries".to_string()),
                data,
                background_color: json!("#3498db"),
                border_color: Some("#2980b9".to_string()),
                border_width: 1,
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": { "display": false } },
            "scales": { "y": { "beginAtZero": true, "ticks": { "stepSize": 1 } } },
            "animation": { "duration": 2000, "easing": "easeOutQuart" }
        }),
    }
}

pub fn timeline_chart(series: &Series) -> ChartConfig {
    let (labels, data) = split_series(series);
    ChartConfig {
        kind: ChartKind::Line,
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: Some("Searches".to_string()),
                data,
                background_color: json!("rgba(52, 152, 219, 0.2)"),
                border_color: Some("#3498db".to_string()),
                border_width: 2,
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": false,
            "scales": { "y": { "beginAtZero": true } }
        }),
    }
}

pub trait ChartHandle {
    fn destroy(&mut self);
    fn resize(&mut self);
}

pub trait ChartBackend {
    type Handle: ChartHandle;

    fn create(&self, slot: ChartSlot, config: &ChartConfig) -> Self::Handle;
}

pub struct ChartRegistry<B: ChartBackend> {
    backend: B,
    live: RefCell<BTreeMap<ChartSlot, B::Handle>>,
}

impl<B: ChartBackend> ChartRegistry<B> {
    pub fn new(backend: B) -> Self {
        ChartRegistry {
            backend,
            live: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn create_or_replace(&self, slot: ChartSlot, config: &ChartConfig) {
        let mut live = self.live.borrow_mut();
        if let Some(mut previous) = live.remove(&slot) {
            log::debug!("destroying chart {}", slot.canvas_id());
            previous.destroy();
        }
        log::debug!("creating {:?} chart {}", config.kind, slot.canvas_id());
        let handle = self.backend.create(slot, config);
        live.insert(slot, handle);
    }

    pub fn destroy(&self, slot: ChartSlot) -> bool {
        match self.live.borrow_mut().remove(&slot) {
            Some(mut handle) => {
                handle.destroy();
                true
            }
            None => false,
        }
    }

    pub fn resize_all(&self) {
        for handle in self.live.borrow_mut().values_mut() {
            handle.resize();
        }
    }

    pub fn live_slots(&self) -> Vec<ChartSlot> {
        self.live.borrow().keys().copied().collect()
    }
}

impl<B: ChartBackend> Drop for ChartRegistry<B> {
    fn drop(&mut self) {
        for (_, mut handle) in std::mem::take(self.live.get_mut()) {
            handle.destroy();
        }
    }
}

type Scripts = Rc<RefCell<BTreeMap<ChartSlot, String>>>;

/// Emits one `<script>` per live chart that instantiates it with Chart.js.
#[derive(Debug, Default, Clone)]
pub struct ChartJsBackend {
    scripts: Scripts,
}

pub struct ChartJsHandle {
    slot: ChartSlot,
    scripts: Scripts,
}

impl ChartJsBackend {
    pub fn new() -> ChartJsBackend {
        ChartJsBackend::default()
    }

    pub fn render_scripts(&self) -> String {
        self.scripts
            .borrow()
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ChartBackend for ChartJsBackend {
    type Handle = ChartJsHandle;

    fn create(&self, slot: ChartSlot, config: &ChartConfig) -> ChartJsHandle {
        let json = serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string());
        // keep the payload from closing the script element early
        let json = json.replace("</", "<\\/");
        let script = format!(
            r#"<script>window.chartInstances = window.chartInstances || {{}}; window.chartInstances["{id}"] = new Chart(document.getElementById("{id}"), {json});</script>"#,
            id = slot.canvas_id(),
        );
        self.scripts.borrow_mut().insert(slot, script);
        ChartJsHandle {
            slot,
            scripts: self.scripts.clone(),
        }
    }
}

impl ChartHandle for ChartJsHandle {
    fn destroy(&mut self) {
        self.scripts.borrow_mut().remove(&self.slot);
    }

    fn resize(&mut self) {
        log::debug!("resize requested for {}", self.slot.canvas_id());
    }
}
