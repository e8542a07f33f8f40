//! loanqa - retrieval-augmented loan question answering
//!
//! Loan records (CSV) and reference documents (PDF, text) are chunked and
//! embedded into a flat vector index. Each question retrieves the closest
//! passages, which are woven into a prompt for a hosted Gemini model
//! together with recent conversation history.
//!
//! # Layout
//!
//! - [`corpus`]: loading and chunking the source material
//! - [`embedding`], [`index`]: sentence embeddings and the vector index
//! - [`generation`]: the hosted text-generation client
//! - [`rag`]: retrieval, prompt strategies, answer composition, pipeline
//! - [`session`]: per-conversation state
//! - [`repl`], [`cli`], [`telemetry`]: terminal surface

pub mod config;
pub mod errors;

pub mod corpus;
pub mod embedding;
pub mod generation;
pub mod index;

pub mod rag;
pub mod session;

pub mod cli;
pub mod repl;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use errors::{ErrorKind, LoanQaError, Result};
pub use rag::{Answer, AnswerOutcome, LoanAssistant};
pub use session::ChatSession;
