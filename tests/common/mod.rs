//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use loanqa::config::Config;
use loanqa::embedding::{Embedder, EMBEDDING_DIM};
use loanqa::generation::GenerationClient;
use loanqa::Result;

pub const CREDIT_CHUNK: &str = "A good credit history increases your chances of loan approval.";
pub const HOME_LOAN_QUESTION: &str = "What increases the chances of getting a home loan?";
pub const EMBEDDER_ID: &str = "hash-embedder";

mock! {
    pub Generator {}

    #[async_trait]
    impl GenerationClient for Generator {
        async fn generate(&self, prompt: &str) -> Result<String>;
        fn model(&self) -> &str;
    }
}

/// Bag-of-words hashing embedder that counts how many texts it embedded
#[derive(Default)]
pub struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embedded_texts(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; EMBEDDING_DIM];
                for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
                    let mut h = DefaultHasher::new();
                    token.to_lowercase().hash(&mut h);
                    v[(h.finish() % EMBEDDING_DIM as u64) as usize] += 1.0;
                }
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    v.iter_mut().for_each(|x| *x /= norm);
                }
                v
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn model_id(&self) -> &str {
        EMBEDDER_ID
    }
}

/// Generator mock that answers `reply` and records each prompt
pub fn recording_generator(reply: &str) -> (MockGenerator, Arc<Mutex<Vec<String>>>) {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let seen = prompts.clone();
    let reply = reply.to_string();

    let mut generator = MockGenerator::new();
    generator.expect_generate().returning(move |prompt| {
        seen.lock().unwrap().push(prompt.to_string());
        Ok(reply.clone())
    });
    (generator, prompts)
}

/// Write a small loan corpus under `dir` and point a config at it
pub fn write_corpus(dir: &Path) -> Config {
    let csv_path = dir.join("loan_data.csv");
    fs::write(
        &csv_path,
        "Loan_ID,Gender,Married,Education,Credit_History,Property_Area,Loan_Status\n\
         LP001002,Male,No,Graduate,1,Urban,Y\n\
         LP001003,Male,Yes,Graduate,1,Rural,N\n\
         LP001005,Female,Yes,Not Graduate,0,Semiurban,N\n",
    )
    .unwrap();

    let docs_dir = dir.join("docs");
    fs::create_dir_all(&docs_dir).unwrap();
    fs::write(docs_dir.join("approval.txt"), CREDIT_CHUNK).unwrap();
    fs::write(
        docs_dir.join("documents.txt"),
        "Salaried applicants should bring three months of salary slips and bank statements.",
    )
    .unwrap();

    let mut config = Config::default();
    config.corpus.csv_path = csv_path;
    config.corpus.docs_dir = docs_dir;
    config.index.path = dir.join("index");
    config
}
