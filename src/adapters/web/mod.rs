//! Web server adapter.
//!
//! Axum server with an HTMX frontend: upload a CSV, inspect the metrics and
//! charts, download the generated HTML report.

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::adapters::html_report_adapter::DEFAULT_TITLE;
use crate::domain::error::TearsheetError;
use crate::domain::settings::AnalysisSettings;
use crate::ports::config_port::{ConfigPort, get_number};

pub const DEFAULT_MAX_UPLOAD_MB: i64 = 20;
pub const DEFAULT_MAX_REPORTS: i64 = 50;

/// Rendered reports by id. Ids increase, so the first entry is the oldest.
pub type ReportCache = Arc<RwLock<BTreeMap<u64, String>>>;

pub fn new_report_cache() -> ReportCache {
    Arc::new(RwLock::new(BTreeMap::new()))
}

pub struct AppState {
    pub settings: AnalysisSettings,
    pub report_title: String,
    pub max_upload_bytes: usize,
    /// Reports kept for download; older ones are evicted first.
    pub max_reports: usize,
    pub reports: ReportCache,
    pub next_report_id: AtomicU64,
}

impl AppState {
    pub fn new(settings: AnalysisSettings, report_title: impl Into<String>) -> Self {
        Self {
            settings,
            report_title: report_title.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB as usize * 1024 * 1024,
            max_reports: DEFAULT_MAX_REPORTS as usize,
            reports: new_report_cache(),
            next_report_id: AtomicU64::new(1),
        }
    }

    /// Settings from `[analysis]`, title from `[report]`, upload limit and
    /// cache size from `[web] max_upload_mb` and `[web] max_reports`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TearsheetError> {
        let settings = AnalysisSettings::from_config(config)?;
        let title = config.get_string_or("report", "title", DEFAULT_TITLE);
        let max_upload_mb = positive(config, "max_upload_mb", DEFAULT_MAX_UPLOAD_MB)?;
        let max_reports = positive(config, "max_reports", DEFAULT_MAX_REPORTS)?;

        let mut state = Self::new(settings, title);
        state.max_upload_bytes = max_upload_mb * 1024 * 1024;
        state.max_reports = max_reports;
        Ok(state)
    }

    /// Cache `html` under a fresh id, evicting the oldest reports beyond
    /// `max_reports`.
    pub async fn store_report(&self, html: String) -> u64 {
        let id = self.next_report_id.fetch_add(1, Ordering::Relaxed);
        let mut reports = self.reports.write().await;
        reports.insert(id, html);
        while reports.len() > self.max_reports.max(1) {
            if let Some((evicted, _)) = reports.pop_first() {
                debug!(report_id = evicted, "evicted cached report");
            }
        }
        id
    }

    pub async fn report(&self, id: u64) -> Option<String> {
        self.reports.read().await.get(&id).cloned()
    }
}

fn positive(config: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, TearsheetError> {
    let value: i64 = get_number(config, "web", key, default)?;
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| TearsheetError::ConfigInvalid {
            section: "web".into(),
            key: key.into(),
            reason: "must be positive".into(),
        })
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/analyze", post(handlers::analyze))
        .route("/report/{id}", get(handlers::download_report))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
