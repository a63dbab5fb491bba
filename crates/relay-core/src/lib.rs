//! relay-core: core library for relay-gateway
//!
//! Configuration, the model-serving client, conversation memory and the
//! chat service used by the HTTP API.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;

pub use chat::ChatService;
pub use config::{ApiConfig, Config, LlmConfig, MemoryConfig};
pub use error::{Error, Result};
pub use llm::{ChatOptions, ChunkStream, ImageOptions, ImagePrompt, ImageResponse, Message, ModelClient, OpenAiClient, Prompt, Role};
pub use memory::{ChatMemory, Conversation};
