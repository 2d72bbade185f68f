use std::collections::VecDeque;

use crate::models::chat::ConversationTurn;

pub const MEMORY_CAPACITY: usize = 10;

/// The last [`MEMORY_CAPACITY`] turns of one session, oldest first.
///
/// One instance per session. It is owned by whatever drives the session (a
/// WebSocket connection task) and handed to the agent by `&mut`, never stored
/// globally.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self {
            turns: VecDeque::with_capacity(MEMORY_CAPACITY + 1),
        }
    }

    pub fn append(&mut self, user_text: impl Into<String>, bot_text: impl Into<String>) {
        self.push(ConversationTurn::new(user_text, bot_text));
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > MEMORY_CAPACITY {
            self.turns.pop_front();
        }
    }

    /// Most recent first.
    pub fn recent(&self) -> Vec<&ConversationTurn> {
        self.turns.iter().rev().collect()
    }

    /// Chronological order.
    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        MEMORY_CAPACITY
    }

    pub fn as_context(&self) -> String {
        let mut result = String::new();
        for turn in &self.turns {
            result.push_str(&format!("user: {}\n", turn.user_text));
            result.push_str(&format!("assistant: {}\n", turn.bot_text));
        }
        result
    }
}

/// Builds the prompt sent to the chat model for a new user message.
pub fn format_prompt(memory: &ConversationMemory, message: &str, include_history: bool) -> String {
    if !include_history || memory.is_empty() {
        return message.to_string();
    }
    format!("{}user: {}\nassistant:", memory.as_context(), message)
}
