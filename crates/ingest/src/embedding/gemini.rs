use async_trait::async_trait;
use pdfqa_core::config::{EmbeddingConfig, GeminiConfig, HttpConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// Gemini `batchEmbedContents` backend.
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    /// Fully qualified model name, e.g. `models/embedding-001`.
    model: String,
    base_url: String,
    dimensions: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(
        api_key: String,
        model: &str,
        base_url: &str,
        dimensions: usize,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model: qualify_model(model),
            base_url: base_url.trim_end_matches('/').to_string(),
            dimensions,
        }
    }

    /// Build from config; fails when `GOOGLE_API_KEY` is missing.
    pub fn from_config(
        gemini: &GeminiConfig,
        embedding: &EmbeddingConfig,
        http: &HttpConfig,
    ) -> Result<Self, EmbeddingError> {
        let api_key = gemini
            .api_key
            .clone()
            .ok_or_else(|| EmbeddingError::NotConfigured("GOOGLE_API_KEY not set".into()))?;
        Ok(Self::new(
            api_key,
            &gemini.embedding_model,
            &gemini.base_url,
            embedding.dimensions,
            http.timeout(),
        ))
    }

    fn build_request<'a>(&'a self, texts: &[&'a str], task_type: TaskType) -> BatchRequest<'a> {
        BatchRequest {
            requests: texts
                .iter()
                .map(|&text| EmbedRequest {
                    model: &self.model,
                    content: Content {
                        parts: [Part { text }],
                    },
                    task_type,
                })
                .collect(),
        }
    }

    async fn embed(&self, texts: &[&str], task_type: TaskType) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v1beta/{}:batchEmbedContents", self.base_url, self.model);
        let request = self.build_request(texts, task_type);

        debug!(model = %self.model, count = texts.len(), ?task_type, "Gemini embed request");

        // Key goes in a header so it never shows up in logged URLs.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api { status, body });
        }

        let parsed: BatchResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: parsed.embeddings.len(),
            });
        }
        let embeddings: Vec<Vec<f32>> = parsed.embeddings.into_iter().map(|e| e.values).collect();

        if let Some(first) = embeddings.first() {
            if first.len() != self.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: first.len(),
                });
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed(texts, TaskType::RetrievalDocument).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text], TaskType::RetrievalQuery).await?;
        Ok(vectors.remove(0))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// The REST API wants `models/<name>`; accept bare names too.
fn qualify_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
