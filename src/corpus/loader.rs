// Corpus loading: tabular records plus a folder of documents
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::corpus::extract::{extract_text, DocumentKind};
use crate::corpus::normalizer::{
    clean_column_name, document_to_chunks, row_to_chunks, Chunk, TabularRow,
};
use crate::errors::{LoanQaError, Result};

/// Extracted document text with its file name
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub name: String,
    pub text: String,
}

/// Load a CSV file, cleaning headers and treating missing cells as empty
pub fn load_tabular(csv_path: &Path) -> Result<Vec<TabularRow>> {
    if !csv_path.is_file() {
        return Err(LoanQaError::CorpusNotFound {
            path: csv_path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(clean_column_name).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), record.get(i).unwrap_or("").trim().to_string()))
            .collect();
        rows.push(TabularRow::new(fields));
    }

    tracing::info!(rows = rows.len(), path = %csv_path.display(), "loaded tabular corpus");
    Ok(rows)
}

/// Extract every PDF / TXT file directly inside `folder`, in name order
///
/// A missing folder yields no documents. The first file that fails
/// extraction aborts the load unless `skip_unreadable` is set, in which
/// case it is left out with a warning.
pub fn load_documents(folder: &Path, skip_unreadable: bool) -> Result<Vec<LoadedDocument>> {
    if !folder.is_dir() {
        tracing::warn!(path = %folder.display(), "documents folder not found, skipping");
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| DocumentKind::from_path(p).is_some())
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match extract_text(&path) {
            Ok(text) => documents.push(LoadedDocument { name, text }),
            Err(e) if skip_unreadable => {
                tracing::warn!(document = %name, error = %e, "skipping unreadable document")
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(documents = documents.len(), path = %folder.display(), "loaded documents");
    Ok(documents)
}

/// All chunks for a corpus version: tabular chunks first, then documents
pub fn collect_corpus_chunks(config: &CorpusConfig) -> Result<Vec<Chunk>> {
    let rows = load_tabular(&config.csv_path)?;
    let mut chunks: Vec<Chunk> = rows
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row_to_chunks(i, row, &config.id_column, config.chunk_size))
        .collect();
    let tabular_count = chunks.len();

    for doc in load_documents(&config.docs_dir, config.skip_unreadable_documents)? {
        chunks.extend(document_to_chunks(
            &doc.name,
            &doc.text,
            config.document_chunking,
            config.chunk_size,
        ));
    }

    tracing::info!(
        tabular = tabular_count,
        documents = chunks.len() - tabular_count,
        "collected corpus chunks"
    );
    Ok(chunks)
}
