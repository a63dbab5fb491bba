//! In-memory conversation store

use dashmap::DashMap;
use tracing::debug;

use crate::llm::Message;
use crate::memory::Conversation;

/// Process-lifetime mapping from chat id to message history.
///
/// Appends to one conversation are serialised by the map's entry guard, so
/// concurrent callers never lose each other's messages. Nothing is persisted.
#[derive(Debug, Default)]
pub struct ChatMemory {
    conversations: DashMap<String, Conversation>,
    /// Maximum messages per conversation (0 = unlimited)
    max_messages: usize,
}

impl ChatMemory {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that keeps at most `max_messages` per conversation
    /// (0 = unlimited)
    pub fn with_max_messages(max_messages: usize) -> Self {
        Self {
            conversations: DashMap::new(),
            max_messages,
        }
    }

    /// Append a message, creating the conversation on first use
    pub fn append(&self, chat_id: &str, message: Message) {
        self.append_all(chat_id, std::iter::once(message));
    }

    /// Append several messages under a single guard, so they stay adjacent
    pub fn append_all(&self, chat_id: &str, messages: impl IntoIterator<Item = Message>) {
        let mut conversation = self
            .conversations
            .entry(chat_id.to_string())
            .or_insert_with(|| {
                debug!("Creating conversation: {}", chat_id);
                Conversation::new(chat_id)
            });

        for message in messages {
            conversation.push(message);
        }

        if self.max_messages > 0 {
            let evicted = conversation.truncate_front(self.max_messages);
            if evicted > 0 {
                debug!("Evicted {} old messages from conversation {}", evicted, chat_id);
            }
        }
    }

    /// Up to `max_count` most recent messages, oldest first. Unknown chat ids
    /// yield an empty history.
    pub fn retrieve(&self, chat_id: &str, max_count: usize) -> Vec<Message> {
        self.conversations
            .get(chat_id)
            .map(|conversation| conversation.last(max_count).to_vec())
            .unwrap_or_default()
    }

    /// Forget a conversation. Returns whether it existed.
    pub fn clear(&self, chat_id: &str) -> bool {
        let removed = self.conversations.remove(chat_id).is_some();
        if removed {
            debug!("Cleared conversation: {}", chat_id);
        }
        removed
    }

    /// Number of known conversations
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    /// Number of stored messages for a conversation
    pub fn message_count(&self, chat_id: &str) -> usize {
        self.conversations
            .get(chat_id)
            .map(|conversation| conversation.len())
            .unwrap_or(0)
    }

    /// Snapshot of a conversation including its timestamps
    pub fn conversation(&self, chat_id: &str) -> Option<Conversation> {
        self.conversations.get(chat_id).map(|c| c.value().clone())
    }
}
