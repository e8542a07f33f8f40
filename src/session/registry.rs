// Session registry: one ChatSession per active conversation
use std::collections::HashMap;
use uuid::Uuid;

use crate::session::conversation::ChatSession;

/// Owns the live sessions of a process
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, ChatSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session and return its id
    pub fn start(&mut self) -> Uuid {
        let session = ChatSession::new();
        let id = session.id();
        self.sessions.insert(id, session);
        tracing::debug!(session = %id, "session started");
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&ChatSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut ChatSession> {
        self.sessions.get_mut(id)
    }

    /// Drop a session and everything it holds
    pub fn end(&mut self, id: &Uuid) -> Option<ChatSession> {
        let removed = self.sessions.remove(id);
        if removed.is_some() {
            tracing::debug!(session = %id, "session ended");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
