//! Request handlers.

pub mod chat;
pub mod health;
pub mod upload;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

/// Turn a rendered page into a response; render failures become a bare 500.
pub(crate) fn render_page(status: StatusCode, page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(component = "templates", error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
