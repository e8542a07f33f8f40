// Deterministic stand-ins for the embedding model and generation service
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use crate::embedding::{Embedder, EMBEDDING_DIM};
use crate::errors::{LoanQaError, Result};
use crate::generation::GenerationClient;

/// Bag-of-words embedder: each lowercase token bumps one hashed bucket
pub struct KeywordEmbedder {
    model_id: String,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            model_id: "keyword-hash".to_string(),
        }
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % EMBEDDING_DIM as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Embedder for KeywordEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Replays queued results and records every prompt it receives
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers every prompt with `text`
    pub fn answering(text: &str) -> Self {
        Self::new((0..16).map(|_| Ok(text.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or(Err(LoanQaError::EmptyResponse))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
