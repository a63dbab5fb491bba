//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{routing::get, Router};

use crate::handlers::{
    custom_chat, custom_stream_chat, generate, generate_stream, health, image, memory_chat,
    prompt, simple_chat, stream_chat, stream_response,
};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Chat with the default system prompt
        .route("/openai/chat/simple/chat1", get(simple_chat))
        .route("/openai/chat/simple/chat2", get(memory_chat))
        .route("/openai/chat/stream/chat", get(stream_chat))
        .route("/openai/chat/stream/response", get(stream_response))
        // Caller-selected model and options
        .route("/openai/chat/custom", get(custom_chat))
        .route("/openai/chat/custom/stream", get(custom_stream_chat))
        // Raw model access
        .route("/ai/image", get(image))
        .route("/ai/generate", get(generate))
        .route("/ai/generateStream", get(generate_stream))
        .route("/ai/prompt", get(prompt))
}
