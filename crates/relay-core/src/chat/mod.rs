//! Chat service
//!
//! System prompt and conversation-memory handling on top of the model client.

mod service;

pub use service::ChatService;
