//! Corpus preparation
//!
//! Loads the tabular loan records and the documents folder, and turns both
//! into bounded-length [`Chunk`]s ready for embedding.

pub mod extract;
pub mod loader;
pub mod normalizer;

pub use extract::{extract_text, validate_document_path, DocumentKind};
pub use loader::{collect_corpus_chunks, load_documents, load_tabular, LoadedDocument};
pub use normalizer::{
    chunk_chars, chunk_words, clean_column_name, document_to_chunks, row_to_chunks, Chunk,
    ChunkSource, DocumentChunking, TabularRow,
};
