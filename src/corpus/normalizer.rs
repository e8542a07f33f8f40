// Text normalizer: bounded-length chunks from tabular rows and documents
use serde::{Deserialize, Serialize};

/// How document text is windowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentChunking {
    /// Fixed-size character windows
    #[default]
    Characters,
    /// Fixed-size word windows, same as tabular rows
    Words,
}

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkSource {
    /// Zero-based data row of the tabular corpus
    Row(usize),
    /// Document file name
    Document(String),
}

/// Bounded unit of text prepared for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: ChunkSource,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: ChunkSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

/// One tabular record: cleaned column names paired with cell values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRow {
    pub fields: Vec<(String, String)>,
}

impl TabularRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Concatenate every non-identifier value, space separated, in column order
    pub fn combined_text(&self, id_column: &str) -> String {
        self.fields
            .iter()
            .filter(|(name, _)| name != id_column)
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normalize a header: trim, spaces to underscores, lowercase
pub fn clean_column_name(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

/// Lazy iterator over fixed-size word windows
///
/// A clone taken before iteration replays the same sequence.
#[derive(Debug, Clone)]
pub struct WordChunks<'a> {
    words: std::str::SplitWhitespace<'a>,
    max_words: usize,
}

impl<'a> Iterator for WordChunks<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let window: Vec<&str> = self.words.by_ref().take(self.max_words).collect();
        if window.is_empty() {
            None
        } else {
            Some(window.join(" "))
        }
    }
}

/// Split text on whitespace into windows of at most `max_words` words
pub fn chunk_words(text: &str, max_words: usize) -> WordChunks<'_> {
    WordChunks {
        words: text.split_whitespace(),
        max_words: max_words.max(1),
    }
}

/// Lazy iterator over fixed-size character windows
#[derive(Debug, Clone)]
pub struct CharChunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

impl<'a> Iterator for CharChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            let split_at = self
                .rest
                .char_indices()
                .nth(self.max_chars)
                .map(|(idx, _)| idx)
                .unwrap_or(self.rest.len());
            let (window, rest) = self.rest.split_at(split_at);
            self.rest = rest;
            // whitespace-only windows carry nothing worth embedding
            if !window.trim().is_empty() {
                return Some(window);
            }
        }
    }
}

/// Split text into windows of at most `max_chars` characters
pub fn chunk_chars(text: &str, max_chars: usize) -> CharChunks<'_> {
    CharChunks {
        rest: text,
        max_chars: max_chars.max(1),
    }
}

/// Chunks for one tabular row
pub fn row_to_chunks(
    row_number: usize,
    row: &TabularRow,
    id_column: &str,
    max_words: usize,
) -> Vec<Chunk> {
    let combined = row.combined_text(id_column);
    chunk_words(&combined, max_words)
        .map(|text| Chunk::new(text, ChunkSource::Row(row_number)))
        .collect()
}

/// Chunks for one document under the given policy
pub fn document_to_chunks(
    name: &str,
    text: &str,
    policy: DocumentChunking,
    size: usize,
) -> Vec<Chunk> {
    let source = || ChunkSource::Document(name.to_string());
    match policy {
        DocumentChunking::Characters => chunk_chars(text, size)
            .map(|window| Chunk::new(window, source()))
            .collect(),
        DocumentChunking::Words => chunk_words(text, size)
            .map(|window| Chunk::new(window, source()))
            .collect(),
    }
}
