//! Retrieval-augmented answering
//!
//! - Retrieval: embed the question, search the active index, filter hits
//! - Prompt: choose a strategy from context strength and render its template
//! - Composer: call the generation client, fall back to an apology on
//!   transient failure
//! - Pipeline: one question per call, recorded on the caller's session

pub mod composer;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

pub use composer::{Answer, AnswerComposer, AnswerOutcome, APOLOGY_MESSAGE};
pub use pipeline::{AskStage, IngestReport, LoanAssistant, TurnResult};
pub use prompt::{
    build_prompt, format_history, is_context_weak, join_context, ComposedPrompt, PromptStrategy,
    PromptTemplate, GROUNDED_TEMPLATE, WEAK_CONTEXT_TEMPLATE, WEAK_CONTEXT_THRESHOLD,
};
pub use retrieval::{filter_relevant, Retriever, SearchParams};
