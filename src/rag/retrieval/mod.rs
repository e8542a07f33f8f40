// Retrieval: query embedding, similarity search, relevance filtering
pub mod engine;
pub mod filter;

pub use engine::{Retriever, SearchParams};
pub use filter::filter_relevant;
