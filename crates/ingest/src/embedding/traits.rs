use async_trait::async_trait;
use pdfqa_core::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Count mismatch: sent {expected} texts, got {actual} vectors")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedder not configured: {0}")]
    NotConfigured(String),
}

impl EmbeddingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EmbeddingError::Http(_) => FailureKind::Unexpected,
            EmbeddingError::Api { status, .. } => FailureKind::from_status(*status),
            EmbeddingError::Parse(_)
            | EmbeddingError::DimensionMismatch { .. }
            | EmbeddingError::CountMismatch { .. }
            | EmbeddingError::NotConfigured(_) => FailureKind::Api,
        }
    }
}

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts, returning one vector per input text (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a search query. Backends that distinguish query and document
    /// embeddings override this.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;
}
