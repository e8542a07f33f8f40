//! Sentence embeddings
//!
//! [`Embedder`] is the seam between the pipeline and the embedding model;
//! [`MiniLmEmbedder`] is the production implementation.

pub mod engine;

pub use engine::MiniLmEmbedder;

use crate::errors::{LoanQaError, Result};

/// Model used at build time and query time
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of the default model
pub const EMBEDDING_DIM: usize = 384;

/// Fixed-dimension text embedding model
pub trait Embedder: Send + Sync {
    /// Embed several texts; output order matches input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Vector length produced by this model
    fn dimension(&self) -> usize;

    /// Identifier stored alongside a persisted index
    fn model_id(&self) -> &str;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| LoanQaError::Embedding("model returned no vector".to_string()))
    }
}
