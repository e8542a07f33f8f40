//! Vector index
//!
//! A flat, append-only chunk store searched by cosine similarity, and the
//! batch builder that embeds a corpus version into it.

pub mod builder;
pub mod store;

pub use builder::{build_corpus_index, IndexBuilder, IndexSummary};
pub use store::{cosine_similarity, IndexEntry, ScoredChunk, VectorIndex, INDEX_FILE};
