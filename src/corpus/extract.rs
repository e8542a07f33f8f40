// Text extraction for PDF and plain-text documents
use lopdf::Document;
use std::fs;
use std::path::Path;

use crate::errors::{LoanQaError, Result};

/// Extensions accepted for document ingestion
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Document formats we can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Detect from the file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// Validate that a path exists and has a supported extension
///
/// Runs before any extraction or embedding work.
pub fn validate_document_path(path: &Path) -> Result<DocumentKind> {
    let kind = DocumentKind::from_path(path).ok_or_else(|| LoanQaError::UnsupportedFileType {
        path: path.to_path_buf(),
        expected: SUPPORTED_EXTENSIONS
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(", "),
    })?;

    if !path.is_file() {
        return Err(LoanQaError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    Ok(kind)
}

/// Extract the full text of a supported document
pub fn extract_text(path: &Path) -> Result<String> {
    match validate_document_path(path)? {
        DocumentKind::Text => extract_text_file(path),
        DocumentKind::Pdf => extract_pdf(path),
    }
}

fn unreadable(path: &Path, reason: impl ToString) -> LoanQaError {
    LoanQaError::DocumentUnreadable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn extract_text_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| unreadable(path, format!("not valid UTF-8 text ({})", e.utf8_error())))
}

/// Extract PDF text page by page, pages joined with newlines
fn extract_pdf(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "extracting PDF text");

    let document = Document::load(path).map_err(|e| unreadable(path, e))?;
    if document.is_encrypted() {
        return Err(unreadable(path, "PDF is encrypted"));
    }

    let mut pages = Vec::new();
    for page_number in document.get_pages().into_keys() {
        let text = document
            .extract_text(&[page_number])
            .map_err(|e| unreadable(path, format!("page {}: {}", page_number, e)))?;
        pages.push(text.trim_end().to_string());
    }

    tracing::debug!(path = %path.display(), pages = pages.len(), "PDF text extracted");
    Ok(pages.join("\n"))
}
