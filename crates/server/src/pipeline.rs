//! Upload to index: extract, chunk, embed and store.

use std::time::Instant;

use pdfqa_ingest::document::chunker::split_text;
use pdfqa_ingest::document::{extract_raw_text, ExtractionError, UploadedDocument};
use pdfqa_vector::{IndexName, IndexingFailed};
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Indexing(#[from] IndexingFailed),
}

/// Build a fresh index from `documents` and return its name.
pub async fn ingest(state: &AppState, documents: Vec<UploadedDocument>) -> Result<IndexName, IngestError> {
    let start = Instant::now();
    let files = documents.len();

    // pdf-extract is CPU-bound.
    let raw = tokio::task::spawn_blocking(move || extract_raw_text(&documents)).await??;

    let chunks: Vec<&str> = split_text(&raw, &state.chunking).collect();
    info!(
        component = "ingest",
        files,
        chars = raw.chars().count(),
        chunks = chunks.len(),
        "documents chunked"
    );

    let name = state.gateway.new_index_name();
    let indexed = state.gateway.index_chunks(&chunks, &name).await?;

    info!(
        component = "ingest",
        index = %indexed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "ingestion complete"
    );
    Ok(indexed)
}
