// Sentence embeddings via all-MiniLM-L6-v2 on Candle
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use crate::embedding::{Embedder, DEFAULT_MODEL_ID, EMBEDDING_DIM};
use crate::errors::{LoanQaError, Result};

/// MiniLM position embeddings cap the sequence length
const MAX_SEQUENCE_LEN: usize = 256;

/// Embedding engine using a sentence-transformers BERT model via Candle
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dimension: usize,
}

impl MiniLmEmbedder {
    /// Load the default model (downloads on first use)
    pub fn new() -> Result<Self> {
        Self::from_hub(DEFAULT_MODEL_ID)
    }

    /// Load a BERT-family sentence model from the HuggingFace Hub
    pub fn from_hub(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| {
            LoanQaError::Embedding(format!("Failed to create HuggingFace API client: {}", e))
        })?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                LoanQaError::Embedding(format!("Failed to download {} for {}: {}", file, model_id, e))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_contents = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_contents)?;
        let dimension = config.hidden_size;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| LoanQaError::Embedding(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer.with_padding(Some(PaddingParams::default()));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..Default::default()
            }))
            .map_err(|e| LoanQaError::Embedding(format!("Failed to configure tokenizer: {}", e)))?;

        // SAFETY: the safetensors file is not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = BertModel::load(vb, &config)?;

        tracing::info!(model = model_id, dimension, "embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: model_id.to_string(),
            dimension,
        })
    }

    /// Mean pooling with attention mask followed by L2 normalization
    fn mean_pool_normalized(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = sum_embeddings.broadcast_div(&sum_mask)?;

        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        Ok(pooled.broadcast_div(&norm)?)
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| LoanQaError::Embedding(format!("Tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let flat_ids: Vec<u32> = encodings.iter().flat_map(|e| e.get_ids().to_vec()).collect();
        let flat_mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().to_vec())
            .collect();
        let flat_types: Vec<u32> = encodings.iter().flat_map(|e| e.get_type_ids().to_vec()).collect();

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, seq_len), &self.device)?;
        let token_type_ids = Tensor::from_vec(flat_types, (batch_size, seq_len), &self.device)?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool_normalized(&hidden, &attention_mask)?;

        Ok(pooled.to_vec2::<f32>()?)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
