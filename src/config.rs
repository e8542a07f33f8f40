//! Configuration management for loanqa
//!
//! TOML-based configuration with defaults, environment overrides and
//! validation. Lookup order: explicit path, `./loanqa.toml`,
//! `~/.loanqa/config.toml`, built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::corpus::DocumentChunking;
use crate::errors::{LoanQaError, Result};

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = "loanqa.toml";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub session: SessionConfig,
}

/// Corpus input locations and chunking policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Tabular loan records
    pub csv_path: PathBuf,
    /// Folder of PDF / TXT documents
    pub docs_dir: PathBuf,
    /// Column excluded from embedding (after name cleaning)
    pub id_column: String,
    /// Max words per tabular chunk, max characters per document window
    pub chunk_size: usize,
    pub document_chunking: DocumentChunking,
    /// Leave out documents whose text cannot be extracted instead of
    /// failing the build
    pub skip_unreadable_documents: bool,
}

/// Persisted index location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub path: PathBuf,
}

/// Sentence-embedding model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model_id: String,
    pub batch_size: usize,
}

/// Retrieval parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Minimum trimmed length for a passage to count as relevant
    pub min_chars: usize,
    /// Candidates fetched per requested result before filtering
    pub overfetch: usize,
}

/// Hosted generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_base: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Answer language requested in prompts
    pub language: String,
    /// Issue a one-shot test call when the client is constructed
    pub verify_on_connect: bool,
}

/// Conversation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Turns of history passed to the composer
    pub history_turns: usize,
    pub history_file: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/loan_data.csv"),
            docs_dir: PathBuf::from("docs"),
            id_column: "loan_id".to_string(),
            chunk_size: 300,
            document_chunking: DocumentChunking::Characters,
            skip_unreadable_documents: false,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("embeddings/loan_index"),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: crate::embedding::DEFAULT_MODEL_ID.to_string(),
            batch_size: 32,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_chars: 20,
            overfetch: 1,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: crate::generation::DEFAULT_API_BASE.to_string(),
            model: crate::generation::DEFAULT_MODEL.to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_secs: 30,
            language: "English".to_string(),
            verify_on_connect: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_turns: 4,
            history_file: "~/.loanqa/history".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults, then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Self::load_default()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LoanQaError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents)
            .map_err(|e| LoanQaError::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    /// Load from the first standard location that exists
    pub fn load_default() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".loanqa").join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Apply `LOANQA_*` overrides from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOANQA_CSV_PATH") {
            self.corpus.csv_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOANQA_DOCS_DIR") {
            self.corpus.docs_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOANQA_INDEX_PATH") {
            self.index.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOANQA_MODEL") {
            self.generation.model = v;
        }
        if let Some(v) = lookup("LOANQA_LANGUAGE") {
            self.generation.language = v;
        }
        if let Some(v) = lookup("LOANQA_TOP_K") {
            self.retrieval.top_k = v
                .parse()
                .map_err(|_| LoanQaError::InvalidConfig(format!("LOANQA_TOP_K is not a number: {}", v)))?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.corpus.chunk_size == 0 {
            return Err(LoanQaError::InvalidConfig(
                "corpus.chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(LoanQaError::InvalidConfig(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.overfetch == 0 {
            return Err(LoanQaError::InvalidConfig(
                "retrieval.overfetch must be at least 1".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(LoanQaError::InvalidConfig(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }

        if self.generation.api_key_env.trim().is_empty() {
            return Err(LoanQaError::InvalidConfig(
                "generation.api_key_env must name an environment variable".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| LoanQaError::InvalidConfig(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// REPL history file
    pub fn history_path(&self) -> PathBuf {
        Self::expand_path(&self.session.history_file)
    }
}
