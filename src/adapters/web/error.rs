//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::domain::error::TearsheetError;

use super::templates::{ErrorTemplate, page};

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
    /// Render only the error fragment, for HTMX requests.
    pub fragment: bool,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fragment: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn as_fragment(mut self, fragment: bool) -> Self {
        self.fragment = fragment;
        self
    }
}

pub fn status_from_error(err: &TearsheetError) -> StatusCode {
    match err {
        TearsheetError::EmptySeries => StatusCode::UNPROCESSABLE_ENTITY,
        TearsheetError::ConfigParse { .. } | TearsheetError::ConfigInvalid { .. } => {
            StatusCode::BAD_REQUEST
        }
        e if e.is_data_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TearsheetError> for WebError {
    fn from(err: TearsheetError) -> Self {
        let status = status_from_error(&err);
        warn!(error = %err, status = status.as_u16(), "request failed");
        Self::new(status, err.to_string())
    }
}

impl From<MultipartError> for WebError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        Self::internal(format!("template rendering failed: {err}"))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        let content = match template.render() {
            Ok(html) => html,
            Err(_) => return (self.status, self.message).into_response(),
        };
        if self.fragment {
            return (self.status, Html(content)).into_response();
        }
        match page("Error", &content) {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, Html(content)).into_response(),
        }
    }
}
