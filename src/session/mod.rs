//! Conversation sessions
//!
//! Everything conversation-scoped lives on a [`ChatSession`]: the turn log,
//! the context snapshot behind each answer, prompt memory, and an optional
//! private index holding uploaded documents. Sessions never share state.

pub mod conversation;
pub mod export;
pub mod memory;
pub mod registry;

pub use conversation::{ChatSession, ConversationTurn, TurnAnswer, PENDING_PLACEHOLDER};
pub use export::{export_session, SessionRecord};
pub use memory::{ConversationMemory, Exchange};
pub use registry::SessionRegistry;
