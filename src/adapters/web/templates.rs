//! HTML templates using Askama.
//!
//! Each page template renders the inner content only. Full page loads wrap it
//! in [`BasePage`]; HTMX requests get the content as a fragment.

use askama::Template;

use crate::adapters::report_view::ReportView;
use crate::domain::dataset::Preview;
use crate::domain::series::DataKind;

#[derive(Template)]
#[template(path = "base.html")]
pub struct BasePage<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub kinds: &'a [DataKind],
    pub max_upload_mb: usize,
    pub default_title: &'a str,
}

#[derive(Template)]
#[template(path = "analysis.html")]
pub struct AnalysisTemplate<'a> {
    pub view: &'a ReportView,
    pub preview: &'a Preview,
    pub file_name: &'a str,
    pub report_id: u64,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

/// Wrap rendered content in the site layout.
pub fn page(title: &str, content: &str) -> Result<String, askama::Error> {
    BasePage { title, content }.render()
}
