//! Conversation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::Message;

/// History of one chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Caller-supplied session key (`chatId`)
    pub chat_id: String,
    /// Messages in chronological order
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(chat_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            chat_id: chat_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message at the tail
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Drop the oldest messages so at most `max` remain. Returns how many
    /// were evicted.
    pub fn truncate_front(&mut self, max: usize) -> usize {
        let excess = self.messages.len().saturating_sub(max);
        if excess > 0 {
            self.messages.drain(..excess);
        }
        excess
    }

    /// Up to `max_count` most recent messages, oldest first
    pub fn last(&self, max_count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(max_count);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_creation() {
        let conversation = Conversation::new("chat-123");
        assert_eq!(conversation.chat_id, "chat-123");
        assert!(conversation.is_empty());
        assert_eq!(conversation.created_at, conversation.updated_at);
    }

    #[test]
    fn test_last_returns_suffix() {
        let mut conversation = Conversation::new("chat-123");
        for i in 0..5 {
            conversation.push(Message::user(format!("m{}", i)));
        }

        let last: Vec<&str> = conversation.last(2).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(last, vec!["m3", "m4"]);
        assert_eq!(conversation.last(10).len(), 5);
        assert!(conversation.last(0).is_empty());
    }

    #[test]
    fn test_truncate_front() {
        let mut conversation = Conversation::new("chat-123");
        for i in 0..5 {
            conversation.push(Message::user(format!("m{}", i)));
        }

        assert_eq!(conversation.truncate_front(3), 2);
        assert_eq!(conversation.messages[0].content, "m2");
        assert_eq!(conversation.truncate_front(3), 0);
    }
}
