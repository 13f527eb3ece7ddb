//! HTML report adapter implementing ReportPort.
//!
//! Generates a self-contained HTML tearsheet from an Askama template with
//! inline SVG charts.

use askama::Template;
use tracing::debug;

use crate::adapters::report_view::{REPORT_CARDS, ReportView};
use crate::domain::analyzer::Analyzer;
use crate::domain::error::TearsheetError;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_TITLE: &str = "Backtest Report";

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    view: &'a ReportView,
}

pub struct HtmlReportAdapter {
    title: String,
}

impl HtmlReportAdapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl ReportPort for HtmlReportAdapter {
    fn render(&self, analyzer: &Analyzer) -> Result<String, TearsheetError> {
        let view = ReportView::build(analyzer, &self.title, &REPORT_CARDS);
        let html = ReportTemplate { view: &view }
            .render()
            .map_err(|e| TearsheetError::Render {
                reason: e.to_string(),
            })?;
        debug!(bytes = html.len(), "rendered HTML report");
        Ok(html)
    }
}
