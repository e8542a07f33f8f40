//! Error types for loanqa
//!
//! Every failure carries an [`ErrorKind`] so callers can tell fatal
//! configuration problems apart from per-turn transient failures.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification used by callers to route failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or rejected resource; blocks startup or first use
    Configuration,
    /// Network or model failure during a single turn; recoverable
    Transient,
    /// Bad user input, detected before any embedding work
    InvalidInput,
    /// Local failure that is neither of the above
    Internal,
}

/// Main error type for the loanqa pipeline
#[derive(Error, Debug)]
pub enum LoanQaError {
    /// Credential environment variable is unset or empty
    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    /// Credential was rejected by the generation service
    #[error("Credential rejected by generation service (HTTP {status}): {message}")]
    CredentialRejected { status: u16, message: String },

    /// One-shot connectivity check at client construction failed
    #[error("Generation service unreachable at startup: {0}")]
    ConnectivityCheckFailed(String),

    /// Persisted vector index is absent
    #[error("Vector index not found at {}. Run `loanqa index` first.", path.display())]
    IndexNotFound { path: PathBuf },

    /// Index was built with a different embedding model
    #[error("Vector index was built with model {found}, expected {expected}")]
    IndexModelMismatch { expected: String, found: String },

    /// Tabular corpus file is absent
    #[error("Corpus file not found: {}", path.display())]
    CorpusNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Input file does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Input file has an extension we cannot ingest
    #[error("Unsupported file type for {}: expected one of {expected}", path.display())]
    UnsupportedFileType { path: PathBuf, expected: String },

    /// Document exists but its text cannot be extracted
    #[error("Cannot read text from {}: {reason}", path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    /// Other malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generation service returned an error response
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Generation service returned no usable text
    #[error("Generation service returned an empty response")]
    EmptyResponse,

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, LoanQaError>;

impl LoanQaError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanQaError::MissingCredential { .. }
            | LoanQaError::CredentialRejected { .. }
            | LoanQaError::ConnectivityCheckFailed(_)
            | LoanQaError::IndexNotFound { .. }
            | LoanQaError::IndexModelMismatch { .. }
            | LoanQaError::CorpusNotFound { .. }
            | LoanQaError::InvalidConfig(_) => ErrorKind::Configuration,
            LoanQaError::Generation(_)
            | LoanQaError::EmptyResponse
            | LoanQaError::Http(_)
            | LoanQaError::Timeout { .. } => ErrorKind::Transient,
            LoanQaError::FileNotFound { .. }
            | LoanQaError::UnsupportedFileType { .. }
            | LoanQaError::DocumentUnreadable { .. }
            | LoanQaError::InvalidInput(_) => ErrorKind::InvalidInput,
            LoanQaError::Embedding(_)
            | LoanQaError::Csv(_)
            | LoanQaError::Serialization(_)
            | LoanQaError::Io(_) => ErrorKind::Internal,
        }
    }

    /// Check if the failure only affects the current turn
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            LoanQaError::MissingCredential { .. } => "MISSING_CREDENTIAL",
            LoanQaError::CredentialRejected { .. } => "CREDENTIAL_REJECTED",
            LoanQaError::ConnectivityCheckFailed(_) => "CONNECTIVITY_CHECK_FAILED",
            LoanQaError::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            LoanQaError::IndexModelMismatch { .. } => "INDEX_MODEL_MISMATCH",
            LoanQaError::CorpusNotFound { .. } => "CORPUS_NOT_FOUND",
            LoanQaError::InvalidConfig(_) => "INVALID_CONFIG",
            LoanQaError::FileNotFound { .. } => "FILE_NOT_FOUND",
            LoanQaError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            LoanQaError::DocumentUnreadable { .. } => "DOCUMENT_UNREADABLE",
            LoanQaError::InvalidInput(_) => "INVALID_INPUT",
            LoanQaError::Generation(_) => "GENERATION_FAILED",
            LoanQaError::EmptyResponse => "EMPTY_RESPONSE",
            LoanQaError::Http(_) => "HTTP_ERROR",
            LoanQaError::Timeout { .. } => "TIMEOUT",
            LoanQaError::Embedding(_) => "EMBEDDING_ERROR",
            LoanQaError::Csv(_) => "CSV_ERROR",
            LoanQaError::Serialization(_) => "SERIALIZATION_ERROR",
            LoanQaError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<candle_core::Error> for LoanQaError {
    fn from(err: candle_core::Error) -> Self {
        LoanQaError::Embedding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoanQaError::MissingCredential {
            var: "GOOGLE_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        let err = LoanQaError::IndexNotFound {
            path: PathBuf::from("embeddings/index"),
        };
        assert!(err.to_string().contains("embeddings/index"));
    }

    #[test]
    fn test_configuration_errors_are_not_transient() {
        let errors = vec![
            LoanQaError::MissingCredential { var: "K".to_string() },
            LoanQaError::IndexNotFound { path: PathBuf::from("x") },
            LoanQaError::CorpusNotFound { path: PathBuf::from("y") },
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn test_generation_errors_are_transient() {
        assert!(LoanQaError::Generation("503".to_string()).is_transient());
        assert!(LoanQaError::EmptyResponse.is_transient());
        assert!(LoanQaError::Timeout { duration_ms: 30_000 }.is_transient());
    }

    #[test]
    fn test_input_errors() {
        let err = LoanQaError::UnsupportedFileType {
            path: PathBuf::from("notes.docx"),
            expected: ".pdf, .txt".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");

        let err = LoanQaError::DocumentUnreadable {
            path: PathBuf::from("docs/scan.pdf"),
            reason: "invalid file header".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("docs/scan.pdf"));
    }
}
