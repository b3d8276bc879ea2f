pub mod batcher;
pub mod gemini;
pub mod traits;

pub use batcher::embed_in_batches;
pub use gemini::GeminiEmbedder;
pub use traits::{Embedder, EmbeddingError};
