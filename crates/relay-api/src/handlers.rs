//! HTTP API handlers
//!
//! Chat, streaming and image handlers. Query parameters map field-to-field
//! onto the options passed to the model client.

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use relay_core::{ChatOptions, ChunkStream, ImageOptions, ImagePrompt, ImageResponse, Prompt};

use crate::error::Result;
use crate::server::AppState;

/// Model used by the custom-model endpoints when none is given
pub const DEFAULT_CUSTOM_MODEL: &str = "deepseek-ai/DeepSeek-R1-Distill-Qwen-7B";

const DEFAULT_CUSTOM_MESSAGE: &str = "Introduce yourself";
const DEFAULT_GENERATE_MESSAGE: &str = "Tell me a joke";

const TEXT_STREAM_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

// ============================================================================
// Query types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub message: String,
}

/// Memory-enabled chat
#[derive(Debug, Deserialize)]
pub struct MemoryChatQuery {
    pub message: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomQuery {
    #[serde(default = "default_custom_model")]
    pub model: String,
    #[serde(default = "default_custom_message")]
    pub message: String,
}

/// Custom streaming chat; sampling options are required
#[derive(Debug, Deserialize)]
pub struct CustomStreamQuery {
    #[serde(default = "default_custom_model")]
    pub model: String,
    pub temperature: f64,
    #[serde(rename = "frequencyPenalty")]
    pub frequency_penalty: f64,
    #[serde(default = "default_custom_message")]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    #[serde(default = "default_generate_message")]
    pub message: String,
}

fn default_custom_model() -> String {
    DEFAULT_CUSTOM_MODEL.to_string()
}

fn default_custom_message() -> String {
    DEFAULT_CUSTOM_MESSAGE.to_string()
}

fn default_generate_message() -> String {
    DEFAULT_GENERATE_MESSAGE.to_string()
}

/// Raw-model generation payload
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Generation {
    pub generation: String,
}

/// Streamed generation frame in chat-response shape: the delta sits under
/// `result.output`, mirrored as the single entry of `results`
#[derive(Debug, Serialize)]
pub struct ChatResponseFrame {
    pub result: GenerationFrame,
    pub results: Vec<GenerationFrame>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationFrame {
    pub output: AssistantOutput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOutput {
    pub message_type: &'static str,
    pub text: String,
}

impl ChatResponseFrame {
    pub fn delta(text: String) -> Self {
        let generation = GenerationFrame {
            output: AssistantOutput {
                message_type: "ASSISTANT",
                text,
            },
        };
        Self {
            result: generation.clone(),
            results: vec![generation],
        }
    }
}

// ============================================================================
// Response shaping
// ============================================================================

/// Relay chunks as a chunked `text/plain` body
fn text_stream(stream: ChunkStream) -> Response {
    let stream = stream.inspect_err(|e| warn!("Stream aborted: {}", e));
    (
        [(header::CONTENT_TYPE, TEXT_STREAM_CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response()
}

/// One `data:` frame per chunk
fn sse_stream(stream: ChunkStream) -> Sse<impl Stream<Item = Result<Event>>> {
    Sse::new(stream.map(|chunk| -> Result<Event> {
        let chunk = chunk.inspect_err(|e| warn!("Stream aborted: {}", e))?;
        Ok(Event::default().data(normalize_newlines(&chunk)))
    }))
}

/// One `data:` frame per chunk, carrying a [`ChatResponseFrame`]
fn generation_stream(stream: ChunkStream) -> Sse<impl Stream<Item = Result<Event>>> {
    Sse::new(stream.map(|chunk| -> Result<Event> {
        let chunk = chunk.inspect_err(|e| warn!("Stream aborted: {}", e))?;
        let data = serde_json::to_string(&ChatResponseFrame::delta(chunk))?;
        Ok(Event::default().data(data))
    }))
}

/// Carriage returns are line breaks in SSE framing
fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Single-turn chat with the default system prompt
pub async fn simple_chat(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<String> {
    debug!("Simple chat request: {:?}", query);
    let reply = state.chat.call(&query.message, ChatOptions::default()).await?;
    Ok(reply)
}

/// Chat that replays and extends the history of `chatId`
pub async fn memory_chat(
    State(state): State<AppState>,
    Query(query): Query<MemoryChatQuery>,
) -> Result<String> {
    debug!("Memory chat request: {:?}", query);
    let retrieve_size = state.config.memory.retrieve_size;
    let reply = state
        .chat
        .call_with_memory(&query.chat_id, &query.message, retrieve_size)
        .await?;
    Ok(reply)
}

/// Streamed plain-text chat
pub async fn stream_chat(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    debug!("Stream chat request: {:?}", query);
    let stream = state.chat.stream(&query.message, ChatOptions::default()).await?;
    Ok(text_stream(stream))
}

/// Streamed chat as server-sent events
pub async fn stream_response(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    debug!("Stream response request: {:?}", query);
    let stream = state.chat.stream(&query.message, ChatOptions::default()).await?;
    Ok(sse_stream(stream))
}

/// Chat with a caller-selected model
pub async fn custom_chat(
    State(state): State<AppState>,
    Query(query): Query<CustomQuery>,
) -> Result<String> {
    debug!("Custom chat request: {:?}", query);
    let options = ChatOptions::builder().model(query.model).build();
    let reply = state.chat.call(&query.message, options).await?;
    Ok(reply)
}

/// Streamed chat with caller-selected model and sampling options
pub async fn custom_stream_chat(
    State(state): State<AppState>,
    Query(query): Query<CustomStreamQuery>,
) -> Result<Response> {
    debug!("Custom stream request: {:?}", query);
    let options = ChatOptions::builder()
        .model(query.model)
        .temperature(query.temperature)
        .frequency_penalty(query.frequency_penalty)
        .build();
    let stream = state.chat.stream(&query.message, options).await?;
    Ok(text_stream(stream))
}

/// Image generation: one HD 1024x1024 image
pub async fn image(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<ImageResponse>> {
    debug!("Image request: {:?}", query);
    let options = ImageOptions::builder()
        .quality("hd")
        .n(1)
        .width(1024)
        .height(1024)
        .build();
    let response = state
        .chat
        .client()
        .generate_image(ImagePrompt::new(query.message, options))
        .await?;
    info!("Generated {} image(s)", response.data.len());
    Ok(Json(response))
}

/// Raw-model generation without a system prompt
pub async fn generate(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<Generation>> {
    debug!("Generate request: {:?}", query);
    let generation = state.chat.client().call(Prompt::user(query.message)).await?;
    Ok(Json(Generation { generation }))
}

/// Raw-model streaming generation
pub async fn generate_stream(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> Result<impl IntoResponse> {
    debug!("Generate stream request: {:?}", query);
    let stream = state.chat.client().stream(Prompt::user(query.message)).await?;
    Ok(generation_stream(stream))
}

/// Raw-model streaming generation with a caller-selected model
pub async fn prompt(
    State(state): State<AppState>,
    Query(query): Query<CustomQuery>,
) -> Result<impl IntoResponse> {
    debug!("Prompt request: {:?}", query);
    let options = ChatOptions::builder().model(query.model).build();
    let stream = state
        .chat
        .client()
        .stream(Prompt::user(query.message).with_options(options))
        .await?;
    Ok(generation_stream(stream))
}
