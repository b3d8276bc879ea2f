use std::sync::Arc;

use pdfqa_ingest::embedding::Embedder;
use tracing::debug;

use crate::backend::{IndexDescription, VectorBackend, VectorError};

/// Similarity search over one live index.
///
/// Cheap to build; the gateway hands out a fresh one per request.
pub struct Retriever {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn Embedder>,
    index: IndexDescription,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<dyn Embedder>,
        index: IndexDescription,
        top_k: usize,
    ) -> Self {
        Self { backend, embedder, index, top_k }
    }

    pub fn index_name(&self) -> &str {
        &self.index.name
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Texts of the `top_k` chunks most similar to `query`, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>, VectorError> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.backend.query(&self.index, vector, self.top_k).await?;
        debug!(index = %self.index.name, hits = hits.len(), "retrieved context");
        Ok(hits.into_iter().map(|h| h.text).collect())
    }
}
