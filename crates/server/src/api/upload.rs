use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use pdfqa_ingest::document::UploadedDocument;
use pdfqa_vector::IndexName;
use tracing::{debug, error, info, warn};

use super::render_page;
use crate::pipeline;
use crate::state::AppState;

pub const NO_FILES_UPLOADED: &str = "No files uploaded.";
pub const PROCESSING_FAILED: &str = "Failed to process the documents.";

const FILE_FIELD: &str = "pdf_files";

pub async fn index_page(State(state): State<Arc<AppState>>) -> Response {
    render_page(StatusCode::OK, state.templates.index(None))
}

/// Ingest the uploaded PDFs, bind the new index to the session and go to chat.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let documents = match multipart {
        Ok(multipart) => match collect_documents(multipart).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(component = "upload", error = %e, "could not read upload body");
                return error_page(&state, e.status(), PROCESSING_FAILED);
            }
        },
        Err(rejection) => {
            debug!(component = "upload", error = %rejection, "not a multipart request");
            Vec::new()
        }
    };

    if documents.is_empty() {
        return error_page(&state, StatusCode::BAD_REQUEST, NO_FILES_UPLOADED);
    }

    info!(component = "upload", files = documents.len(), "processing upload");
    match pipeline::ingest(&state, documents).await {
        Ok(index) => {
            let previous = state.sessions.session_id(&headers);
            let binding = state.sessions.bind_index(previous, index.into_string()).await;
            release_indexes(&state, &binding.released).await;
            (
                [(SET_COOKIE, state.sessions.cookie(&binding.session_id))],
                Redirect::to("/chat"),
            )
                .into_response()
        }
        Err(e) => {
            error!(component = "upload", error = %e, "ingestion failed");
            error_page(&state, StatusCode::UNPROCESSABLE_ENTITY, PROCESSING_FAILED)
        }
    }
}

/// Non-empty `pdf_files` parts, in request order.
async fn collect_documents(mut multipart: Multipart) -> Result<Vec<UploadedDocument>, MultipartError> {
    let mut documents = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            // Browsers send an empty part when no file was chosen.
            debug!(component = "upload", filename = %filename, "skipping empty file part");
            continue;
        }
        documents.push(UploadedDocument::new(filename, bytes.to_vec()));
    }
    Ok(documents)
}

/// Drop indexes no session refers to anymore.
async fn release_indexes(state: &AppState, names: &[String]) {
    for raw in names {
        match IndexName::parse(raw.as_str()) {
            Ok(name) => state.gateway.release(&name).await,
            Err(e) => warn!(component = "upload", error = %e, "skipping release of invalid index name"),
        }
    }
}

fn error_page(state: &AppState, status: StatusCode, message: &str) -> Response {
    render_page(status, state.templates.index(Some(message)))
}
