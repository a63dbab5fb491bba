//! Model-serving client trait
//!
//! Handlers and the chat service only see this trait, so the upstream API
//! can be swapped (or scripted in tests).

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::llm::types::{ImagePrompt, ImageResponse, Prompt};
use crate::Result;

/// Lazy sequence of text deltas from a streaming completion
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Chat completion, returning the reply text
    async fn call(&self, prompt: Prompt) -> Result<String>;

    /// Streaming chat completion.
    ///
    /// Dropping the returned stream cancels the upstream request.
    async fn stream(&self, prompt: Prompt) -> Result<ChunkStream>;

    /// Image generation
    async fn generate_image(&self, prompt: ImagePrompt) -> Result<ImageResponse>;

    /// Model used when a prompt does not name one
    fn default_model(&self) -> &str;
}
