// Chunk store builder: embed a corpus version and persist it
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::corpus::{collect_corpus_chunks, Chunk};
use crate::embedding::Embedder;
use crate::errors::Result;
use crate::index::store::VectorIndex;

/// Outcome of a full index build
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub chunk_count: usize,
    pub dimension: usize,
    pub path: PathBuf,
    pub elapsed: Duration,
}

/// Embeds chunks in batches into a [`VectorIndex`]
pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn Embedder, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            show_progress: false,
        }
    }

    /// Show a terminal progress bar while embedding
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Embed `texts` into a fresh in-memory index
    pub fn embed_texts(&self, texts: &[String]) -> Result<VectorIndex> {
        let mut index = VectorIndex::new(self.embedder.model_id(), self.embedder.dimension());
        self.append_texts(&mut index, texts)?;
        Ok(index)
    }

    /// Embed `texts` and append them to an existing index
    pub fn append_texts(&self, index: &mut VectorIndex, texts: &[String]) -> Result<()> {
        let progress = self.progress_bar(texts.len() as u64);

        for batch in texts.chunks(self.batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let vectors = self.embedder.embed_batch(&refs)?;
            index.add_batch(batch.to_vec(), vectors)?;
            progress.inc(batch.len() as u64);
        }

        progress.finish_and_clear();
        Ok(())
    }

    /// Embed every chunk and write the index to `dir`
    pub fn build(&self, chunks: &[Chunk], dir: &Path) -> Result<IndexSummary> {
        let start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        tracing::info!(
            chunks = texts.len(),
            model = self.embedder.model_id(),
            "embedding corpus"
        );
        let index = self.embed_texts(&texts)?;
        let path = index.save(dir)?;

        Ok(IndexSummary {
            chunk_count: index.len(),
            dimension: index.dimension(),
            path,
            elapsed: start.elapsed(),
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} Embedding [{bar:40.cyan/blue}] {pos}/{len} chunks")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar
    }
}

/// Collect the configured corpus and rebuild the persisted index
pub fn build_corpus_index(
    config: &Config,
    embedder: &dyn Embedder,
    show_progress: bool,
) -> Result<IndexSummary> {
    let chunks = collect_corpus_chunks(&config.corpus)?;
    IndexBuilder::new(embedder, config.embedding.batch_size)
        .with_progress(show_progress)
        .build(&chunks, &config.index.path)
}
