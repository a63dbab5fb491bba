//! Chat client facade over a [`ModelClient`]

use std::sync::Arc;

use tracing::{debug, info};

use crate::llm::{ChatOptions, ChunkStream, Message, ModelClient, Prompt};
use crate::memory::ChatMemory;
use crate::Result;

/// Applies the default system prompt and conversation memory before
/// forwarding prompts to the model client.
#[derive(Clone)]
pub struct ChatService {
    client: Arc<dyn ModelClient>,
    memory: Arc<ChatMemory>,
    system_prompt: Option<String>,
}

impl ChatService {
    pub fn new(client: Arc<dyn ModelClient>, memory: Arc<ChatMemory>) -> Self {
        Self {
            client,
            memory,
            system_prompt: None,
        }
    }

    /// Set the system prompt prepended to every chat
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    pub fn memory(&self) -> &Arc<ChatMemory> {
        &self.memory
    }

    fn build_prompt(&self, history: Vec<Message>, message: &str, options: ChatOptions) -> Prompt {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(history);
        messages.push(Message::user(message));
        Prompt::new(messages, options)
    }

    /// Single-turn chat
    pub async fn call(&self, message: &str, options: ChatOptions) -> Result<String> {
        let prompt = self.build_prompt(Vec::new(), message, options);
        self.client.call(prompt).await
    }

    /// Single-turn streaming chat
    pub async fn stream(&self, message: &str, options: ChatOptions) -> Result<ChunkStream> {
        let prompt = self.build_prompt(Vec::new(), message, options);
        self.client.stream(prompt).await
    }

    /// Chat with the last `retrieve_size` messages of `chat_id` as context.
    ///
    /// On success the user message and the reply are appended to the
    /// conversation; a failed call leaves the history untouched.
    pub async fn call_with_memory(
        &self,
        chat_id: &str,
        message: &str,
        retrieve_size: usize,
    ) -> Result<String> {
        let history = self.memory.retrieve(chat_id, retrieve_size);
        debug!(
            "Chat {}: replaying {} history message(s)",
            chat_id,
            history.len()
        );

        let prompt = self.build_prompt(history, message, ChatOptions::default());
        let reply = self.client.call(prompt).await?;

        self.memory.append_all(
            chat_id,
            [Message::user(message), Message::assistant(reply.clone())],
        );
        info!(
            "Chat {}: {} message(s) in memory",
            chat_id,
            self.memory.message_count(chat_id)
        );

        Ok(reply)
    }
}
