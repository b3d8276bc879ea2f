use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::backend::{IndexDescription, IndexSpec, ScoredText, VectorBackend, VectorError, VectorRecord};

const API_VERSION: &str = "2024-07";

/// Pinecone serverless REST client.
pub struct PineconeBackend {
    client: Client,
    api_key: String,
    controller_url: String,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Deserialize, Default)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: TextMetadata<'a>,
}

#[derive(Serialize)]
struct TextMetadata<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

impl From<IndexModel> for IndexDescription {
    fn from(m: IndexModel) -> Self {
        IndexDescription {
            name: m.name,
            host: m.host,
            dimension: m.dimension,
            ready: m.status.ready,
        }
    }
}

impl PineconeBackend {
    pub fn new(api_key: String, controller_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            controller_url: controller_url.trim_end_matches('/').to_string(),
        }
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn data_url(host: &str, path: &str) -> String {
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}{path}", host.trim_end_matches('/'))
        } else {
            format!("https://{host}{path}")
        }
    }

    async fn api_error(response: Response) -> VectorError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        VectorError::Api { status, body }
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, VectorError> {
        response.json().await.map_err(|e| VectorError::Parse(e.to_string()))
    }
}

#[async_trait]
impl VectorBackend for PineconeBackend {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    async fn list_indexes(&self) -> Result<Vec<String>, VectorError> {
        let url = format!("{}/indexes", self.controller_url);
        let response = self.authed(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        let list: IndexList = Self::parse(response).await?;
        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorError> {
        let url = format!("{}/indexes", self.controller_url);
        let body = json!({
            "name": spec.name,
            "dimension": spec.dimension,
            "metric": spec.metric,
            "spec": {
                "serverless": { "cloud": spec.cloud, "region": spec.region }
            },
        });

        debug!(index = %spec.name, dimension = spec.dimension, "Pinecone create index");
        let response = self.authed(self.client.post(&url)).json(&body).send().await?;

        // 409: someone else created it between our list and create.
        if response.status().is_success() || response.status().as_u16() == 409 {
            return Ok(());
        }
        Err(Self::api_error(response).await)
    }

    async fn delete_index(&self, name: &str) -> Result<(), VectorError> {
        let url = format!("{}/indexes/{name}", self.controller_url);
        debug!(index = %name, "Pinecone delete index");
        let response = self.authed(self.client.delete(&url)).send().await?;
        if response.status().is_success() || response.status().as_u16() == 404 {
            return Ok(());
        }
        Err(Self::api_error(response).await)
    }

    async fn describe_index(&self, name: &str) -> Result<IndexDescription, VectorError> {
        let url = format!("{}/indexes/{name}", self.controller_url);
        let response = self.authed(self.client.get(&url)).send().await?;
        if response.status().as_u16() == 404 {
            return Err(VectorError::IndexNotFound(name.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        let model: IndexModel = Self::parse(response).await?;
        Ok(model.into())
    }

    async fn upsert(
        &self,
        index: &IndexDescription,
        records: Vec<VectorRecord>,
    ) -> Result<usize, VectorError> {
        if records.is_empty() {
            return Ok(0);
        }
        let vectors: Vec<UpsertVector<'_>> = records
            .iter()
            .map(|r| UpsertVector {
                id: &r.id,
                values: &r.values,
                metadata: TextMetadata { text: &r.text },
            })
            .collect();

        let url = Self::data_url(&index.host, "/vectors/upsert");
        debug!(index = %index.name, count = vectors.len(), "Pinecone upsert");
        let response = self
            .authed(self.client.post(&url))
            .json(&json!({ "vectors": vectors }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        let parsed: UpsertResponse = Self::parse(response).await?;
        Ok(parsed.upserted_count)
    }

    async fn query(
        &self,
        index: &IndexDescription,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<ScoredText>, VectorError> {
        let url = Self::data_url(&index.host, "/query");
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });

        debug!(index = %index.name, top_k, "Pinecone query");
        let response = self.authed(self.client.post(&url)).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        let parsed: QueryResponse = Self::parse(response).await?;
        Ok(parsed.matches.into_iter().map(into_scored).collect())
    }
}

/// Matches without a `text` metadata field come back with empty text.
fn into_scored(m: QueryMatch) -> ScoredText {
    let text = m
        .metadata
        .as_ref()
        .and_then(|md| md.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();
    ScoredText { id: m.id, score: m.score, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer one request with `status_line` and an empty body; returns the
    /// base URL and the request line that was received.
    async fn serve_once(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn backend(base: &str) -> PineconeBackend {
        PineconeBackend::new("key".into(), base, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn delete_sends_delete_and_accepts_accepted() {
        let (base, request) = serve_once("202 Accepted").await;
        backend(&base).delete_index("pdfqa-abc").await.unwrap();
        assert_eq!(request.await.unwrap(), "DELETE /indexes/pdfqa-abc HTTP/1.1");
    }

    #[tokio::test]
    async fn delete_of_missing_index_succeeds() {
        let (base, _request) = serve_once("404 Not Found").await;
        assert!(backend(&base).delete_index("gone").await.is_ok());
    }

    #[tokio::test]
    async fn delete_failure_keeps_status() {
        let (base, _request) = serve_once("500 Internal Server Error").await;
        let err = backend(&base).delete_index("x").await.unwrap_err();
        assert!(matches!(err, VectorError::Api { status: 500, .. }));
    }

    #[test]
    fn describe_response_maps_to_description() {
        let raw = json!({
            "name": "pdfqa-abc",
            "dimension": 768,
            "metric": "cosine",
            "host": "pdfqa-abc-xyz.svc.us-east-1.pinecone.io",
            "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } },
            "status": { "ready": true, "state": "Ready" }
        });
        let model: IndexModel = serde_json::from_value(raw).unwrap();
        let desc: IndexDescription = model.into();
        assert_eq!(desc.name, "pdfqa-abc");
        assert_eq!(desc.dimension, 768);
        assert!(desc.ready);
    }

    #[test]
    fn initializing_index_is_not_ready() {
        let raw = json!({ "name": "x", "status": { "ready": false, "state": "Initializing" } });
        let model: IndexModel = serde_json::from_value(raw).unwrap();
        assert!(!IndexDescription::from(model).ready);
    }

    #[test]
    fn data_url_adds_scheme_when_missing() {
        assert_eq!(
            PineconeBackend::data_url("idx.svc.pinecone.io", "/query"),
            "https://idx.svc.pinecone.io/query"
        );
        assert_eq!(
            PineconeBackend::data_url("http://localhost:5081/", "/vectors/upsert"),
            "http://localhost:5081/vectors/upsert"
        );
    }

    #[test]
    fn upsert_vectors_carry_text_metadata() {
        let record = VectorRecord { id: "1".into(), values: vec![0.5, 0.25], text: "chunk".into() };
        let v = UpsertVector {
            id: &record.id,
            values: &record.values,
            metadata: TextMetadata { text: &record.text },
        };
        let body = serde_json::to_value(&v).unwrap();
        assert_eq!(body["metadata"]["text"], "chunk");
        assert_eq!(body["values"][1], 0.25);
    }

    #[test]
    fn query_matches_extract_text() {
        let raw = json!({
            "matches": [
                { "id": "a", "score": 0.9, "metadata": { "text": "alpha" } },
                { "id": "b", "score": 0.5 }
            ],
            "namespace": ""
        });
        let parsed: QueryResponse = serde_json::from_value(raw).unwrap();
        let hits: Vec<ScoredText> = parsed.matches.into_iter().map(into_scored).collect();
        assert_eq!(hits[0].text, "alpha");
        assert_eq!(hits[1].text, "");
    }
}
