//! HTTP router construction.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, Request};
use axum::routing::get;
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::api;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_mb * 1024 * 1024;
    let request_timeout = state.config.server.request_timeout();
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // Layers run bottom-up: the request id is set before the trace span opens.
    Router::new()
        .route("/", get(api::upload::index_page).post(api::upload::upload))
        .route("/chat", get(api::chat::chat_page).post(api::chat::ask))
        .route("/health", get(api::health::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let correlation_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                correlation_id = %correlation_id,
            )
        }))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}
