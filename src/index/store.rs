// Flat vector index: append-only chunk store with cosine search
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{LoanQaError, Result};

/// File written inside the index directory
pub const INDEX_FILE: &str = "index.json";

/// On-disk format version
const FORMAT_VERSION: u32 = 1;

/// One stored chunk and its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub text: String,
    pub vector: Vec<f32>,
}

/// Result from a nearest-neighbour search
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// Insertion position of the chunk
    pub position: usize,
    pub text: String,
    pub score: f32,
}

/// Flat similarity index over chunk embeddings
///
/// - Entries keep insertion order; identity is positional
/// - Search is an exhaustive cosine scan
/// - Persisted as a single JSON file inside a directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    format_version: u32,
    model_id: String,
    dimension: usize,
    built_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index for vectors from `model_id`
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            model_id: model_id.into(),
            dimension,
            built_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Append one chunk
    ///
    /// Rejects vectors of the wrong dimension or containing NaN/Infinity.
    pub fn add(&mut self, text: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        self.check_vector(&vector)?;
        self.entries.push(IndexEntry {
            text: text.into(),
            vector,
        });
        Ok(())
    }

    /// Append chunks in order; all-or-nothing
    pub fn add_batch(&mut self, texts: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if texts.len() != vectors.len() {
            return Err(LoanQaError::Embedding(format!(
                "got {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &vectors {
            self.check_vector(vector)?;
        }
        self.entries.extend(
            texts
                .into_iter()
                .zip(vectors)
                .map(|(text, vector)| IndexEntry { text, vector }),
        );
        Ok(())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(LoanQaError::Embedding(format!(
                "Invalid vector dimensions: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(LoanQaError::Embedding(
                "Invalid vector values: contains NaN or Infinity".to_string(),
            ));
        }
        Ok(())
    }

    /// Top-k entries by cosine similarity, best first
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimension {
            return Err(LoanQaError::Embedding(format!(
                "Invalid query dimensions: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| ScoredChunk {
                position,
                text: entry.text.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        results.truncate(k);

        Ok(results)
    }

    /// Stored chunk texts in insertion order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Write the index into `dir`, replacing any previous build
    ///
    /// The file is written beside the target and renamed into place, so a
    /// reader never observes a partially written index.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE);
        let tmp_path = dir.join(format!("{}.tmp", INDEX_FILE));

        let json = serde_json::to_string(self)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;

        tracing::info!(chunks = self.len(), path = %path.display(), "vector index saved");
        Ok(path)
    }

    /// Load an index built with `expected_model`
    pub fn load(dir: &Path, expected_model: &str) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            return Err(LoanQaError::IndexNotFound {
                path: dir.to_path_buf(),
            });
        }

        let json = fs::read_to_string(&path)?;
        let index: VectorIndex = serde_json::from_str(&json)?;

        if index.model_id != expected_model {
            return Err(LoanQaError::IndexModelMismatch {
                expected: expected_model.to_string(),
                found: index.model_id,
            });
        }

        tracing::info!(chunks = index.len(), path = %path.display(), "vector index loaded");
        Ok(index)
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
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
    use tempfile::TempDir;

    fn index_with(vectors: &[(&str, [f32; 3])]) -> VectorIndex {
        let mut index = VectorIndex::new("test-model", 3);
        for (text, v) in vectors {
            index.add(*text, v.to_vec()).unwrap();
        }
        index
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_add_rejects_bad_vectors() {
        let mut index = VectorIndex::new("m", 3);
        assert!(index.add("short", vec![1.0, 2.0]).is_err());
        assert!(index.add("nan", vec![f32::NAN, 0.0, 0.0]).is_err());
        assert!(index.add("inf", vec![f32::INFINITY, 0.0, 0.0]).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn test_add_batch_is_all_or_nothing() {
        let mut index = VectorIndex::new("m", 2);
        let result = index.add_batch(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 0.0], vec![1.0]],
        );
        assert!(result.is_err());
        assert!(index.is_empty());

        let result = index.add_batch(vec!["a".to_string()], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = index_with(&[
            ("east", [1.0, 0.0, 0.0]),
            ("north", [0.0, 1.0, 0.0]),
            ("north-east", [0.7, 0.7, 0.0]),
        ]);
        let results = index.search(&[0.0, 1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "north");
        assert_eq!(results[1].text, "north-east");
        assert_eq!(results[0].position, 1);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let index = index_with(&[("first", [1.0, 0.0, 0.0]), ("second", [1.0, 0.0, 0.0])]);
        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results[0].text, "first");
        assert_eq!(results[1].text, "second");
    }

    #[test]
    fn test_search_empty_and_bad_query() {
        let index = VectorIndex::new("m", 3);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
        assert!(index.search(&[1.0], 5).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let index = index_with(&[("a", [1.0, 0.0, 0.0]), ("b", [0.0, 1.0, 0.0])]);
        let path = index.save(&dir.path().join("idx")).unwrap();
        assert!(path.ends_with(INDEX_FILE));

        let loaded = VectorIndex::load(&dir.path().join("idx"), "test-model").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.texts().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            loaded.search(&[0.0, 1.0, 0.0], 1).unwrap()[0].text,
            index.search(&[0.0, 1.0, 0.0], 1).unwrap()[0].text
        );
        assert!(!dir.path().join("idx").join("index.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = VectorIndex::load(&dir.path().join("nope"), "m").unwrap_err();
        assert!(matches!(err, LoanQaError::IndexNotFound { .. }));
    }

    #[test]
    fn test_load_model_mismatch() {
        let dir = TempDir::new().unwrap();
        index_with(&[("a", [1.0, 0.0, 0.0])]).save(dir.path()).unwrap();
        let err = VectorIndex::load(dir.path(), "other-model").unwrap_err();
        assert!(matches!(err, LoanQaError::IndexModelMismatch { .. }));
    }
}
