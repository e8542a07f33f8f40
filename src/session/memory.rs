//! Conversation memory: short-term prompt history for one session
//!
//! Each instance carries its own id, so a reset can be observed as a
//! replacement rather than a clear.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Maximum number of exchanges kept before the oldest are dropped
const MAX_EXCHANGES: usize = 1000;

/// One saved (input, output) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub input: String,
    pub output: String,
}

impl Exchange {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Bounded FIFO buffer of exchanges
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    instance_id: Uuid,
    exchanges: VecDeque<Exchange>,
    capacity: usize,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_EXCHANGES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            instance_id: Uuid::new_v4(),
            exchanges: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Save one exchange, evicting the oldest at capacity
    pub fn save_context(&mut self, input: impl Into<String>, output: impl Into<String>) {
        if self.exchanges.len() >= self.capacity {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange::new(input, output));
    }

    /// Last `n` exchanges in chronological order
    pub fn recent(&self, n: usize) -> Vec<&Exchange> {
        let start = self.exchanges.len().saturating_sub(n);
        self.exchanges.range(start..).collect()
    }

    pub fn exchanges(&self) -> &VecDeque<Exchange> {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_recent() {
        let mut memory = ConversationMemory::new();
        for i in 0..5 {
            memory.save_context(format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(memory.len(), 5);

        let recent = memory.recent(4);
        let inputs: Vec<&str> = recent.iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs, vec!["q1", "q2", "q3", "q4"]);
        assert_eq!(memory.recent(10).len(), 5);
        assert!(memory.recent(0).is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut memory = ConversationMemory::with_capacity(2);
        memory.save_context("first", "1");
        memory.save_context("second", "2");
        memory.save_context("third", "3");
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.exchanges()[0].input, "second");
        assert_eq!(memory.exchanges()[1].input, "third");
    }

    #[test]
    fn test_long_conversation_stays_bounded_and_ordered() {
        let mut memory = ConversationMemory::with_capacity(3);
        for i in 0..10 {
            memory.save_context(format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(memory.len(), 3);
        let inputs: Vec<&str> = memory.recent(3).iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs, vec!["q7", "q8", "q9"]);
    }

    #[test]
    fn test_instances_are_distinct() {
        let a = ConversationMemory::new();
        let b = ConversationMemory::new();
        assert_ne!(a.instance_id(), b.instance_id());
        assert!(a.is_empty());
    }
}
