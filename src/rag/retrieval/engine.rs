// Retrieval engine: embed the query, search the index, filter the hits
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::errors::{LoanQaError, Result};
use crate::index::VectorIndex;
use crate::rag::retrieval::filter::filter_relevant;

/// Search parameters for retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of passages returned
    pub top_k: usize,
    /// Minimum trimmed length of a preferred passage
    pub min_chars: usize,
    /// Candidates searched per requested passage; 1 filters exactly the top k
    pub overfetch: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for SearchParams {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            min_chars: config.min_chars,
            overfetch: config.overfetch.max(1),
        }
    }
}

/// Query-time retriever over a [`VectorIndex`]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    params: SearchParams,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, params: SearchParams) -> Self {
        Self { embedder, params }
    }

    /// Retrieve with the default `top_k`
    pub fn retrieve(&self, index: &VectorIndex, query: &str) -> Result<Vec<String>> {
        self.retrieve_top_k(index, query, self.params.top_k)
    }

    /// Up to `k` relevant passages for `query`, best first
    ///
    /// The `k * overfetch` nearest chunks are searched and then filtered.
    /// With an overfetch above 1, short passages among the top `k` can be
    /// replaced by longer ones ranked below it.
    pub fn retrieve_top_k(&self, index: &VectorIndex, query: &str, k: usize) -> Result<Vec<String>> {
        if index.model_id() != self.embedder.model_id() {
            return Err(LoanQaError::IndexModelMismatch {
                expected: self.embedder.model_id().to_string(),
                found: index.model_id().to_string(),
            });
        }
        if k == 0 || index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query)?;
        let fetch = k.saturating_mul(self.params.overfetch.max(1));
        let candidates: Vec<String> = index
            .search(&query_vector, fetch)?
            .into_iter()
            .map(|hit| hit.text)
            .collect();

        let passages = filter_relevant(&candidates, k, self.params.min_chars);
        tracing::info!(
            candidates = candidates.len(),
            passages = passages.len(),
            k,
            "retrieved context"
        );
        Ok(passages)
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
}
