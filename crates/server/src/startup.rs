//! Builds the production `AppState` from configuration.

use std::sync::Arc;

use anyhow::Context;
use pdfqa_core::Config;
use pdfqa_ingest::embedding::GeminiEmbedder;
use tracing::info;

use crate::state::AppState;

pub fn build_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let embedder = GeminiEmbedder::from_config(&config.gemini, &config.embedding, &config.http)
        .context("creating embedding client")?;
    let backend = pdfqa_vector::create_backend(&config.vector, &config.http)
        .context("creating vector backend")?;
    let llm = pdfqa_llm::providers::create_provider(&config.gemini, &config.http)
        .context("creating generation client")?;

    info!(
        vector_provider = backend.name(),
        chat_model = %config.gemini.chat_model,
        "components ready"
    );

    let state = AppState::new(config, backend, Arc::new(embedder), llm)?;
    Ok(Arc::new(state))
}
