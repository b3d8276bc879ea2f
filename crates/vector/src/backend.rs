use async_trait::async_trait;
use pdfqa_core::FailureKind;
use pdfqa_ingest::embedding::EmbeddingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Similarity metric used for every index this service creates.
pub const METRIC_COSINE: &str = "cosine";

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("index '{name}' not ready after {waited_secs}s")]
    NotReady { name: String, waited_secs: u64 },

    #[error("index '{name}' has dimension {actual}, expected {expected}")]
    DimensionMismatch { name: String, expected: usize, actual: usize },

    #[error("invalid index name '{0}': use 1-45 lowercase letters, digits or '-'")]
    InvalidName(String),

    #[error("nothing to index")]
    NothingToIndex,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector backend not configured: {0}")]
    NotConfigured(String),
}

impl VectorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            VectorError::Http(_) => FailureKind::Unexpected,
            VectorError::Api { status, .. } => FailureKind::from_status(*status),
            VectorError::NotReady { .. } => FailureKind::Internal,
            VectorError::Embedding(e) => e.kind(),
            VectorError::Parse(_)
            | VectorError::IndexNotFound(_)
            | VectorError::DimensionMismatch { .. }
            | VectorError::NotConfigured(_) => FailureKind::Api,
            VectorError::InvalidName(_) | VectorError::NothingToIndex => FailureKind::Unexpected,
        }
    }
}

/// Parameters for creating an index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    /// Serverless deployment topology.
    pub cloud: String,
    pub region: String,
}

/// What the control plane reports about an index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescription {
    pub name: String,
    /// Data-plane host queries and upserts go to.
    pub host: String,
    pub dimension: usize,
    pub ready: bool,
}

/// One embedded chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
}

/// A query hit, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredText {
    pub id: String,
    pub score: f32,
    pub text: String,
}

/// Control-plane and data-plane operations of a hosted vector index service.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Names of all existing indexes.
    async fn list_indexes(&self) -> Result<Vec<String>, VectorError>;

    /// Create an index. Succeeds if it already exists.
    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorError>;

    /// Delete an index. Succeeds if it is already gone.
    async fn delete_index(&self, name: &str) -> Result<(), VectorError>;

    /// Look an index up; `IndexNotFound` if absent.
    async fn describe_index(&self, name: &str) -> Result<IndexDescription, VectorError>;

    /// Insert or overwrite records, returning how many were written.
    async fn upsert(
        &self,
        index: &IndexDescription,
        records: Vec<VectorRecord>,
    ) -> Result<usize, VectorError>;

    /// Nearest records to `vector`, best first.
    async fn query(
        &self,
        index: &IndexDescription,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<ScoredText>, VectorError>;
}
