//! Model-serving client and types
//!
//! Speaks the OpenAI-compatible chat completion and image generation APIs.

mod client;
pub mod sse;
mod traits;
mod types;

pub use client::OpenAiClient;
pub use traits::{ChunkStream, ModelClient};
pub use types::*;
