//! Chat session: turns, context snapshots, memory and the private index
//!
//! Invariant: every finalized turn at position `i` has its context snapshot
//! at `contexts[i]`. A pending turn, if any, is always the last turn and has
//! no snapshot yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LoanQaError, Result};
use crate::index::VectorIndex;
use crate::session::memory::ConversationMemory;

/// Text shown for an answer still being generated
pub const PENDING_PLACEHOLDER: &str = "(thinking...)";

/// Answer state of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAnswer {
    Pending,
    Final(String),
}

/// One question/answer exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: TurnAnswer,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn is_pending(&self) -> bool {
        self.answer == TurnAnswer::Pending
    }

    /// Final answer, or the placeholder while pending
    pub fn answer_text(&self) -> &str {
        match &self.answer {
            TurnAnswer::Pending => PENDING_PLACEHOLDER,
            TurnAnswer::Final(text) => text,
        }
    }
}

/// Conversation-scoped state container, one per active session
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    turns: Vec<ConversationTurn>,
    contexts: Vec<Vec<String>>,
    memory: ConversationMemory,
    private_index: Option<VectorIndex>,
    uploaded: Vec<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            turns: Vec::new(),
            contexts: Vec::new(),
            memory: ConversationMemory::new(),
            private_index: None,
            uploaded: Vec::new(),
        }
    }

    /// Append a provisional turn so the UI can render an in-flight state
    ///
    /// Returns the turn position. Only one turn may be pending at a time.
    pub fn begin_turn(&mut self, question: impl Into<String>) -> Result<usize> {
        if self.pending().is_some() {
            return Err(LoanQaError::InvalidInput(
                "a question is already awaiting its answer".to_string(),
            ));
        }
        self.turns.push(ConversationTurn {
            question: question.into(),
            answer: TurnAnswer::Pending,
            asked_at: Utc::now(),
        });
        Ok(self.turns.len() - 1)
    }

    /// Replace the pending answer, record the snapshot, update memory
    pub fn complete_turn(&mut self, answer: impl Into<String>, context: Vec<String>) -> Result<usize> {
        let position = self.turns.len().checked_sub(1).filter(|_| self.pending().is_some());
        let position = position.ok_or_else(|| {
            LoanQaError::InvalidInput("no pending turn to complete".to_string())
        })?;

        let answer = answer.into();
        let turn = &mut self.turns[position];
        turn.answer = TurnAnswer::Final(answer.clone());
        self.memory.save_context(turn.question.clone(), answer);
        self.contexts.push(context);

        debug_assert_eq!(self.contexts.len(), self.turns.len());
        Ok(position)
    }

    /// Drop a pending turn whose answer could not be produced
    pub fn abandon_pending(&mut self) -> Option<ConversationTurn> {
        if self.pending().is_some() {
            self.turns.pop()
        } else {
            None
        }
    }

    /// Clear turns and snapshots and start a fresh memory instance
    ///
    /// Documents uploaded into the private index stay available.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.contexts.clear();
        self.memory = ConversationMemory::new();
    }

    /// The in-flight turn, if any
    pub fn pending(&self) -> Option<&ConversationTurn> {
        self.turns.last().filter(|t| t.is_pending())
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn contexts(&self) -> &[Vec<String>] {
        &self.contexts
    }

    /// Context snapshot that produced turn `position`
    pub fn context_for(&self, position: usize) -> Option<&[String]> {
        self.contexts.get(position).map(Vec::as_slice)
    }

    pub fn last_context(&self) -> Option<&[String]> {
        self.contexts.last().map(Vec::as_slice)
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Session-private index, present once a document has been uploaded
    pub fn private_index(&self) -> Option<&VectorIndex> {
        self.private_index.as_ref()
    }

    /// Merge embedded document chunks into the private index
    ///
    /// The first upload seeds the private index with a full copy of `base`.
    /// Returns the private index size after merging.
    pub fn augment_index(
        &mut self,
        base: &VectorIndex,
        document: impl Into<String>,
        additions: &VectorIndex,
    ) -> Result<usize> {
        if additions.model_id() != base.model_id() {
            return Err(LoanQaError::IndexModelMismatch {
                expected: base.model_id().to_string(),
                found: additions.model_id().to_string(),
            });
        }

        let index = self.private_index.get_or_insert_with(|| base.clone());
        let (texts, vectors): (Vec<String>, Vec<Vec<f32>>) = additions
            .entries()
            .iter()
            .map(|e| (e.text.clone(), e.vector.clone()))
            .unzip();
        index.add_batch(texts, vectors)?;

        self.uploaded.push(document.into());
        Ok(index.len())
    }

    /// Names of documents merged into the private index
    pub fn uploaded_documents(&self) -> &[String] {
        &self.uploaded
    }

    /// Plain-text transcript: one `You:` / `Bot:` block per turn
    pub fn export_transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("You: {}\nBot: {}", t.question, t.answer_text()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
