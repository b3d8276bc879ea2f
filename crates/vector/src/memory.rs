use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{IndexDescription, IndexSpec, ScoredText, VectorBackend, VectorError, VectorRecord};

struct MemoryIndex {
    dimension: usize,
    records: Vec<VectorRecord>,
}

/// Process-local backend with brute-force cosine search.
///
/// Indexes are ready as soon as they are created and vanish on restart.
#[derive(Default)]
pub struct InMemoryBackend {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored in `name`, if it exists.
    pub async fn record_count(&self, name: &str) -> Option<usize> {
        self.indexes.read().await.get(name).map(|i| i.records.len())
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_indexes(&self) -> Result<Vec<String>, VectorError> {
        let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorError> {
        self.indexes
            .write()
            .await
            .entry(spec.name.clone())
            .or_insert_with(|| MemoryIndex { dimension: spec.dimension, records: Vec::new() });
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), VectorError> {
        self.indexes.write().await.remove(name);
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<IndexDescription, VectorError> {
        let indexes = self.indexes.read().await;
        let index = indexes
            .get(name)
            .ok_or_else(|| VectorError::IndexNotFound(name.to_string()))?;
        Ok(IndexDescription {
            name: name.to_string(),
            host: format!("memory://{name}"),
            dimension: index.dimension,
            ready: true,
        })
    }

    async fn upsert(
        &self,
        index: &IndexDescription,
        records: Vec<VectorRecord>,
    ) -> Result<usize, VectorError> {
        let mut indexes = self.indexes.write().await;
        let stored = indexes
            .get_mut(&index.name)
            .ok_or_else(|| VectorError::IndexNotFound(index.name.clone()))?;

        if let Some(bad) = records.iter().find(|r| r.values.len() != stored.dimension) {
            return Err(VectorError::DimensionMismatch {
                name: index.name.clone(),
                expected: stored.dimension,
                actual: bad.values.len(),
            });
        }

        let written = records.len();
        for record in records {
            match stored.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => stored.records.push(record),
            }
        }
        Ok(written)
    }

    async fn query(
        &self,
        index: &IndexDescription,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<ScoredText>, VectorError> {
        let indexes = self.indexes.read().await;
        let stored = indexes
            .get(&index.name)
            .ok_or_else(|| VectorError::IndexNotFound(index.name.clone()))?;

        let mut hits: Vec<ScoredText> = stored
            .records
            .iter()
            .map(|r| ScoredText {
                id: r.id.clone(),
                score: cosine_similarity(&vector, &r.values),
                text: r.text.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> IndexSpec {
        IndexSpec {
            name: name.into(),
            dimension: 2,
            metric: "cosine".into(),
            cloud: "aws".into(),
            region: "us-east-1".into(),
        }
    }

    fn record(id: &str, values: [f32; 2], text: &str) -> VectorRecord {
        VectorRecord { id: id.into(), values: values.to_vec(), text: text.into() }
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let backend = InMemoryBackend::new();
        backend.create_index(&spec("a")).await.unwrap();
        let desc = backend.describe_index("a").await.unwrap();
        backend.upsert(&desc, vec![record("1", [1.0, 0.0], "x")]).await.unwrap();

        backend.create_index(&spec("a")).await.unwrap();
        assert_eq!(backend.record_count("a").await, Some(1));
        assert_eq!(backend.list_indexes().await.unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn query_returns_nearest_first() {
        let backend = InMemoryBackend::new();
        backend.create_index(&spec("a")).await.unwrap();
        let desc = backend.describe_index("a").await.unwrap();
        backend
            .upsert(
                &desc,
                vec![
                    record("east", [1.0, 0.0], "east"),
                    record("north", [0.0, 1.0], "north"),
                    record("northeast", [1.0, 1.0], "northeast"),
                ],
            )
            .await
            .unwrap();

        let hits = backend.query(&desc, vec![0.9, 0.1], 2).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["east", "northeast"]);
    }

    #[tokio::test]
    async fn upsert_overwrites_same_id() {
        let backend = InMemoryBackend::new();
        backend.create_index(&spec("a")).await.unwrap();
        let desc = backend.describe_index("a").await.unwrap();
        backend.upsert(&desc, vec![record("1", [1.0, 0.0], "old")]).await.unwrap();
        backend.upsert(&desc, vec![record("1", [1.0, 0.0], "new")]).await.unwrap();

        let hits = backend.query(&desc, vec![1.0, 0.0], 4).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "new");
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let backend = InMemoryBackend::new();
        backend.create_index(&spec("a")).await.unwrap();
        let desc = backend.describe_index("a").await.unwrap();
        let bad = VectorRecord { id: "1".into(), values: vec![1.0, 2.0, 3.0], text: "x".into() };
        let err = backend.upsert(&desc, vec![bad]).await.unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { expected: 2, actual: 3, .. }));
    }

    #[tokio::test]
    async fn delete_removes_index_and_tolerates_missing() {
        let backend = InMemoryBackend::new();
        backend.create_index(&spec("a")).await.unwrap();
        backend.create_index(&spec("b")).await.unwrap();

        backend.delete_index("a").await.unwrap();
        backend.delete_index("a").await.unwrap();
        assert_eq!(backend.list_indexes().await.unwrap(), vec!["b".to_string()]);
        assert!(backend.record_count("a").await.is_none());
    }

    #[tokio::test]
    async fn missing_index_is_not_found() {
        let backend = InMemoryBackend::new();
        assert!(matches!(
            backend.describe_index("nope").await,
            Err(VectorError::IndexNotFound(_))
        ));
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
