use std::sync::Arc;
use std::time::Duration;

use pdfqa_core::config::{EmbeddingConfig, VectorConfig};
use pdfqa_core::FailureKind;
use pdfqa_ingest::embedding::{embed_in_batches, Embedder};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::{IndexDescription, IndexSpec, VectorBackend, VectorError, VectorRecord, METRIC_COSINE};
use crate::naming::{IndexName, IndexNaming};
use crate::retriever::Retriever;

/// Records per upsert request.
pub const UPSERT_BATCH_SIZE: usize = 32;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Any failure while building an index, collapsed to one outcome.
#[derive(Debug, Error)]
#[error("indexing failed ({kind})")]
pub struct IndexingFailed {
    pub kind: FailureKind,
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub dimension: usize,
    pub cloud: String,
    pub region: String,
    pub naming: IndexNaming,
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub embed_batch_size: usize,
    pub top_k: usize,
}

impl GatewaySettings {
    pub fn from_config(vector: &VectorConfig, embedding: &EmbeddingConfig) -> Result<Self, VectorError> {
        Ok(Self {
            dimension: embedding.dimensions,
            cloud: vector.cloud.clone(),
            region: vector.region.clone(),
            naming: IndexNaming::from_config(vector)?,
            ready_timeout: vector.ready_timeout(),
            poll_interval: POLL_INTERVAL,
            embed_batch_size: embedding.batch_size,
            top_k: vector.top_k,
        })
    }
}

/// Owns the index lifecycle: create-if-missing, fill, and hand out retrievers.
pub struct VectorIndexGateway {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn Embedder>,
    settings: GatewaySettings,
}

impl VectorIndexGateway {
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<dyn Embedder>,
        settings: GatewaySettings,
    ) -> Self {
        Self { backend, embedder, settings }
    }

    pub fn provider(&self) -> &'static str {
        self.backend.name()
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Name for the next upload batch, per the configured naming mode.
    pub fn new_index_name(&self) -> IndexName {
        self.settings.naming.next_name()
    }

    /// Create the index if it is missing and wait until it serves traffic.
    pub async fn ensure_index(&self, name: &IndexName) -> Result<IndexDescription, VectorError> {
        self.create_if_missing(name).await?;
        self.ready_description(name).await
    }

    /// Delete an index this service owns once nothing refers to it.
    ///
    /// Only per-session indexes are deleted; the shared index is left alone.
    /// Failures are logged and swallowed.
    pub async fn release(&self, name: &IndexName) {
        if !matches!(self.settings.naming, IndexNaming::PerSession { .. }) {
            return;
        }
        match self.backend.delete_index(name.as_str()).await {
            Ok(()) => info!(component = "vector_gateway", index = %name, "index released"),
            Err(e) => warn!(
                component = "vector_gateway",
                error_kind = %e.kind(),
                index = %name,
                error = %e,
                "could not release index"
            ),
        }
    }

    /// Embed `chunks` and write them into `name`, creating it if needed.
    ///
    /// An index created by a failed call is released again.
    pub async fn index_chunks(&self, chunks: &[&str], name: &IndexName) -> Result<IndexName, IndexingFailed> {
        let start = Instant::now();
        let mut created = false;
        match self.try_index_chunks(chunks, name, &mut created).await {
            Ok(written) => {
                info!(
                    index = %name,
                    chunks = chunks.len(),
                    written,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "index built"
                );
                Ok(name.clone())
            }
            Err(e) => {
                let kind = e.kind();
                error!(
                    component = "vector_gateway",
                    error_kind = %kind,
                    index = %name,
                    error = %e,
                    "indexing failed"
                );
                if created {
                    self.release(name).await;
                }
                Err(IndexingFailed { kind })
            }
        }
    }

    /// Fresh retrieval handle over an existing index.
    pub async fn resolve(&self, name: &IndexName) -> Result<Retriever, VectorError> {
        let desc = self.backend.describe_index(name.as_str()).await?;
        Ok(Retriever::new(
            self.backend.clone(),
            self.embedder.clone(),
            desc,
            self.settings.top_k,
        ))
    }

    async fn try_index_chunks(
        &self,
        chunks: &[&str],
        name: &IndexName,
        created: &mut bool,
    ) -> Result<usize, VectorError> {
        if chunks.is_empty() {
            return Err(VectorError::NothingToIndex);
        }
        *created = self.create_if_missing(name).await?;
        let desc = self.ready_description(name).await?;

        let vectors = embed_in_batches(self.embedder.as_ref(), chunks, self.settings.embed_batch_size).await?;
        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(text, values)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                values,
                text: (*text).to_string(),
            })
            .collect();

        let mut written = 0;
        let total_batches = records.len().div_ceil(UPSERT_BATCH_SIZE);
        for (i, batch) in records.chunks(UPSERT_BATCH_SIZE).enumerate() {
            debug!(index = %name, batch = i + 1, total_batches, "upserting");
            written += self.backend.upsert(&desc, batch.to_vec()).await?;
        }
        Ok(written)
    }

    /// Returns whether this call created the index.
    async fn create_if_missing(&self, name: &IndexName) -> Result<bool, VectorError> {
        let existing = self.backend.list_indexes().await?;
        if existing.iter().any(|n| n == name.as_str()) {
            debug!(index = %name, "index already exists");
            return Ok(false);
        }
        info!(index = %name, dimension = self.settings.dimension, "creating index");
        self.backend.create_index(&self.index_spec(name)).await?;
        Ok(true)
    }

    async fn ready_description(&self, name: &IndexName) -> Result<IndexDescription, VectorError> {
        let desc = self.wait_until_ready(name).await?;
        if desc.dimension != self.settings.dimension {
            return Err(VectorError::DimensionMismatch {
                name: desc.name,
                expected: self.settings.dimension,
                actual: desc.dimension,
            });
        }
        Ok(desc)
    }

    async fn wait_until_ready(&self, name: &IndexName) -> Result<IndexDescription, VectorError> {
        let deadline = Instant::now() + self.settings.ready_timeout;
        loop {
            let desc = self.backend.describe_index(name.as_str()).await?;
            if desc.ready {
                return Ok(desc);
            }
            if Instant::now() >= deadline {
                return Err(VectorError::NotReady {
                    name: name.to_string(),
                    waited_secs: self.settings.ready_timeout.as_secs(),
                });
            }
            debug!(index = %name, "waiting for index to become ready");
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    fn index_spec(&self, name: &IndexName) -> IndexSpec {
        IndexSpec {
            name: name.to_string(),
            dimension: self.settings.dimension,
            metric: METRIC_COSINE.to_string(),
            cloud: self.settings.cloud.clone(),
            region: self.settings.region.clone(),
        }
    }
}
