//! Vector index gateway: makes sure a remote similarity-search index exists,
//! fills it with embedded chunks, and hands out retrieval handles for it.

pub mod backend;
pub mod gateway;
pub mod memory;
pub mod naming;
pub mod pinecone;
pub mod retriever;

pub use backend::{IndexDescription, IndexSpec, ScoredText, VectorBackend, VectorError, VectorRecord};
pub use gateway::{GatewaySettings, IndexingFailed, VectorIndexGateway};
pub use memory::InMemoryBackend;
pub use naming::{IndexName, IndexNaming};
pub use pinecone::PineconeBackend;
pub use retriever::Retriever;

use std::sync::Arc;

use pdfqa_core::config::{HttpConfig, VectorConfig, VectorProvider};

/// Create the configured vector backend.
pub fn create_backend(
    vector: &VectorConfig,
    http: &HttpConfig,
) -> Result<Arc<dyn VectorBackend>, VectorError> {
    match vector.provider {
        VectorProvider::Pinecone => {
            let api_key = vector
                .pinecone_api_key
                .clone()
                .ok_or_else(|| VectorError::NotConfigured("PINECONE_API_KEY not set".into()))?;
            Ok(Arc::new(PineconeBackend::new(
                api_key,
                &vector.controller_url,
                http.timeout(),
            )))
        }
        VectorProvider::Memory => Ok(Arc::new(InMemoryBackend::new())),
    }
}
