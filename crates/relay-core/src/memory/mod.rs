//! Conversation memory
//!
//! Keeps per-session chat history in process memory so memory-enabled chat
//! calls can replay recent turns to the model.

mod store;
mod types;

pub use store::ChatMemory;
pub use types::Conversation;
