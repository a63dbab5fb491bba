//! relay-api: HTTP API for relay-gateway
//!
//! Exposes chat, streaming and image endpoints over the model-serving
//! client. Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{build_router, start_server, AppState};
