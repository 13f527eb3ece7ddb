//! HTTP request handlers for web adapter.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::adapters::report_view::{DASHBOARD_CARDS, ReportView};
use crate::domain::analyzer::Analyzer;
use crate::domain::dataset::{DataSeries, Dataset};
use crate::domain::series::DataKind;
use crate::ports::report_port::ReportPort;

use super::templates::{AnalysisTemplate, DashboardTemplate, page};
use super::{AppState, WebError, is_htmx_request};

pub const REPORT_FILE_NAME: &str = "backtest_report.html";

/// Fragment for HTMX requests, full page otherwise.
fn respond(headers: &HeaderMap, title: &str, content: String) -> Result<Response, WebError> {
    if is_htmx_request(headers) {
        Ok(Html(content).into_response())
    } else {
        Ok(Html(page(title, &content)?).into_response())
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let template = DashboardTemplate {
        kinds: &DataKind::ALL,
        max_upload_mb: state.max_upload_bytes / (1024 * 1024),
        default_title: &state.report_title,
    };
    respond(&headers, "Dashboard", template.render()?)
}

/// Fields of the upload form.
#[derive(Debug, Default)]
pub struct AnalyzeForm {
    pub file_name: Option<String>,
    pub file: Vec<u8>,
    pub kind: Option<String>,
    pub benchmark: Vec<u8>,
    pub title: Option<String>,
}

impl AnalyzeForm {
    pub async fn read(multipart: &mut Multipart) -> Result<Self, WebError> {
        let mut form = AnalyzeForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    form.file_name = field.file_name().map(str::to_string);
                    form.file = field.bytes().await?.to_vec();
                }
                "benchmark" => form.benchmark = field.bytes().await?.to_vec(),
                "kind" => form.kind = Some(field.text().await?),
                "title" => form.title = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }
}

fn utf8(bytes: Vec<u8>, what: &str) -> Result<String, WebError> {
    String::from_utf8(bytes)
        .map_err(|_| WebError::bad_request(format!("{what} is not valid UTF-8 text")))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let htmx = is_htmx_request(&headers);
    run_analysis(&state, &headers, &mut multipart)
        .await
        .map_err(|e| e.as_fragment(htmx))
}

async fn run_analysis(
    state: &AppState,
    headers: &HeaderMap,
    multipart: &mut Multipart,
) -> Result<Response, WebError> {
    let form = AnalyzeForm::read(multipart).await?;
    if form.file.is_empty() {
        return Err(WebError::bad_request("no CSV file uploaded"));
    }

    let kind: DataKind = form.kind.as_deref().unwrap_or("returns").parse()?;
    let adapter = CsvAdapter::default();
    let Dataset { series, preview } = adapter.parse(&utf8(form.file, "uploaded file")?, kind)?;

    let mut analyzer = Analyzer::load(series, state.settings.clone())?;
    if !form.benchmark.is_empty() {
        let bench = adapter.parse(&utf8(form.benchmark, "benchmark file")?, DataKind::Returns)?;
        if let DataSeries::Returns(returns) = bench.series {
            analyzer = analyzer.with_benchmark(returns);
        }
    }

    let title = form
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| state.report_title.clone());

    let report = HtmlReportAdapter::new(title.as_str()).render(&analyzer)?;
    let report_id = state.store_report(report).await;
    let view = ReportView::build(&analyzer, &title, &DASHBOARD_CARDS);

    let file_name = form.file_name.unwrap_or_else(|| "upload.csv".to_string());
    info!(
        report_id,
        kind = %kind,
        periods = view.periods,
        file = %file_name,
        "analysis complete"
    );

    let template = AnalysisTemplate {
        view: &view,
        preview: &preview,
        file_name: &file_name,
        report_id,
    };
    respond(headers, &title, template.render()?)
}

pub async fn download_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Response, WebError> {
    let html = state
        .report(id)
        .await
        .ok_or_else(|| WebError::not_found(format!("report {id} not found")))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
            ),
        ],
        html,
    )
        .into_response())
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn not_found() -> Response {
    WebError::new(StatusCode::NOT_FOUND, "page not found").into_response()
}
