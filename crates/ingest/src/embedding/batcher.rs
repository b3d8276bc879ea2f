use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// Embed `texts` in request-sized batches, preserving input order.
///
/// Stops at the first failing batch; no partial result is returned.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[&str],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);
    let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        debug!(batch = i + 1, total_batches, size = batch.len(), "embedding batch");
        let vectors = embedder.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            });
        }
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbedder {
        call_count: AtomicUsize,
        dims: usize,
    }

    impl FakeEmbedder {
        fn new(dims: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                dims,
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            // Encode each text's length so ordering can be checked.
            Ok(texts.iter().map(|t| vec![t.len() as f32; self.dims]).collect())
        }

        fn dimensions(&self) -> usize {
            self.dims
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(vec![vec![0.0; 2]])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn splits_into_batches_in_order() {
        let embedder = FakeEmbedder::new(4);
        let texts = ["a", "bb", "ccc", "dddd", "eeeee"];

        let result = embed_in_batches(&embedder, &texts, 2).await.unwrap();

        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 3);
        let firsts: Vec<f32> = result.iter().map(|v| v[0]).collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let embedder = FakeEmbedder::new(4);
        let result = embed_in_batches(&embedder, &[], 10).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_response_is_an_error() {
        let err = embed_in_batches(&ShortEmbedder, &["a", "b"], 10).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::CountMismatch { expected: 2, actual: 1 }));
    }

    #[tokio::test]
    async fn default_embed_query_uses_batch() {
        let embedder = FakeEmbedder::new(3);
        let v = embedder.embed_query("four").await.unwrap();
        assert_eq!(v, vec![4.0, 4.0, 4.0]);
    }
}
