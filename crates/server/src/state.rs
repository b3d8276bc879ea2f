use std::sync::Arc;

use pdfqa_core::config::Environment;
use pdfqa_core::Config;
use pdfqa_ingest::document::chunker::ChunkConfig;
use pdfqa_ingest::embedding::Embedder;
use pdfqa_llm::{LlmProvider, StuffQaChain};
use pdfqa_vector::{GatewaySettings, VectorBackend, VectorIndexGateway};

use crate::session::SessionStore;
use crate::templates::Templates;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub config: Config,
    pub chunking: ChunkConfig,
    pub gateway: VectorIndexGateway,
    pub qa_chain: Arc<StuffQaChain>,
    pub sessions: SessionStore,
    pub templates: Templates,
}

impl AppState {
    /// Wire the components around already-built backends.
    pub fn new(
        config: Config,
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<dyn Embedder>,
        llm: Box<dyn LlmProvider>,
    ) -> anyhow::Result<Self> {
        let chunking = ChunkConfig::try_from(&config.chunking)?;
        let settings = GatewaySettings::from_config(&config.vector, &config.embedding)?;
        let gateway = VectorIndexGateway::new(backend, embedder, settings);
        let qa_chain = Arc::new(StuffQaChain::new(
            llm,
            config.gemini.temperature,
            config.gemini.max_tokens,
        ));
        let sessions = SessionStore::new(
            &config.session.secret,
            config.session.ttl(),
            config.environment == Environment::Production,
        )?;
        let templates = Templates::new()?;

        Ok(Self {
            config,
            chunking,
            gateway,
            qa_chain,
            sessions,
            templates,
        })
    }
}
