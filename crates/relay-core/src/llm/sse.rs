//! Server-Sent Events decoding for streamed chat completions
//!
//! Event framing (line buffering, `data:` joining, comments) is handled by
//! `eventsource-stream`; [`content_stream`] maps each event's payload to a
//! content delta and turns the body into a [`ChunkStream`].

use std::pin::Pin;

use bytes::Bytes;
use eventsource_stream::{EventStream, EventStreamError, Eventsource};
use futures::{stream, Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::Error;
use crate::llm::traits::ChunkStream;
use crate::llm::types::ChatCompletionChunk;

/// Terminal payload sent by OpenAI-compatible APIs
pub const DONE_MARKER: &str = "[DONE]";

/// What one event payload means for the content stream
#[derive(Debug, PartialEq)]
enum Payload {
    Content(String),
    Skip,
    Done,
    Failed(String),
}

fn classify(payload: &str) -> Payload {
    let payload = payload.trim();
    if payload == DONE_MARKER {
        return Payload::Done;
    }

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => return Payload::Failed(format!("Invalid stream payload: {} - {}", e, payload)),
    };

    if let Some(error) = value.get("error") {
        return Payload::Failed(error.to_string());
    }

    match serde_json::from_value::<ChatCompletionChunk>(value) {
        Ok(chunk) => match chunk.content() {
            Some(text) => Payload::Content(text.to_string()),
            None => Payload::Skip,
        },
        Err(e) => Payload::Failed(format!("Invalid stream chunk: {}", e)),
    }
}

struct DecodeState<S> {
    events: Pin<Box<EventStream<S>>>,
    done: bool,
}

fn stream_error<E: Into<Error>>(error: EventStreamError<E>) -> Error {
    match error {
        EventStreamError::Transport(e) => e.into(),
        EventStreamError::Utf8(e) => Error::ModelApi(format!("Invalid UTF-8 in stream: {}", e)),
        EventStreamError::Parser(e) => Error::ModelApi(format!("Invalid event stream: {:?}", e)),
    }
}

/// Decode an SSE byte stream into content deltas.
///
/// The stream ends at `[DONE]` or end-of-body; the first transport or
/// payload error is yielded and then the stream ends. Dropping the returned
/// stream drops `inner`.
pub fn content_stream<S, E>(inner: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    let state = DecodeState {
        events: Box::pin(inner.eventsource()),
        done: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        loop {
            let event = match state.events.as_mut().next().await? {
                Ok(event) => event,
                Err(e) => {
                    state.done = true;
                    return Some((Err(stream_error(e)), state));
                }
            };

            match classify(&event.data) {
                Payload::Content(text) => return Some((Ok(text), state)),
                Payload::Skip => continue,
                Payload::Done => {
                    debug!("Stream completed");
                    return None;
                }
                Payload::Failed(message) => {
                    warn!("Model API stream error: {}", message);
                    state.done = true;
                    return Some((Err(Error::ModelApi(message)), state));
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn chunk(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": text}}]})
        )
    }

    fn byte_stream(parts: Vec<Vec<u8>>) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    #[tokio::test]
    async fn test_content_stream_reassembles_split_lines() {
        let body = [chunk("你好"), chunk(" world")].concat();
        // One byte at a time splits lines and multi-byte characters
        let parts: Vec<Vec<u8>> = body.as_bytes().chunks(1).map(|c| c.to_vec()).collect();

        let chunks: Vec<String> = content_stream(byte_stream(parts)).try_collect().await.unwrap();
        assert_eq!(chunks, vec!["你好".to_string(), " world".to_string()]);
    }

    #[tokio::test]
    async fn test_content_stream_skips_comments_and_other_fields() {
        let body = format!(
            ": keep-alive\r\nevent: message\r\nid: 3\r\n{}: ping\n\n{}",
            chunk("a").replace("\n\n", "\r\n\r\n"),
            chunk("b")
        );

        let chunks: Vec<String> = content_stream(byte_stream(vec![body.into_bytes()]))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("[DONE]"), Payload::Done);
        assert_eq!(
            classify(r#"{"choices":[{"delta":{"content":"x"}}]}"#),
            Payload::Content("x".to_string())
        );
        assert_eq!(classify(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), Payload::Skip);
        assert!(matches!(classify("not json"), Payload::Failed(_)));
        assert!(matches!(classify(r#"{"error":{"message":"quota"}}"#), Payload::Failed(_)));
    }

    #[tokio::test]
    async fn test_content_stream_yields_deltas_until_done() {
        let body = [chunk("Hel"), chunk("lo"), "data: [DONE]\n\n".to_string(), chunk("ignored")].concat();
        // Re-chunk the body at awkward boundaries
        let parts: Vec<Vec<u8>> = body.as_bytes().chunks(5).map(|c| c.to_vec()).collect();

        let chunks: Vec<String> = content_stream(byte_stream(parts)).try_collect().await.unwrap();
        assert_eq!(chunks, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn test_content_stream_ends_without_done_marker() {
        let body = [
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n".to_string(),
            chunk("only"),
        ]
        .concat();

        let chunks: Vec<String> = content_stream(byte_stream(vec![body.into_bytes()]))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks, vec!["only".to_string()]);
    }

    #[tokio::test]
    async fn test_content_stream_stops_after_transport_error() {
        let parts: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(chunk("first"))),
            Err(std::io::Error::other("connection reset")),
            Ok(Bytes::from(chunk("never"))),
        ];

        let items: Vec<_> = content_stream(stream::iter(parts)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "first");
        assert!(matches!(items[1], Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_content_stream_surfaces_api_error_payload() {
        let body = "data: {\"error\":{\"message\":\"rate limited\"}}\n\n";
        let items: Vec<_> = content_stream(byte_stream(vec![body.as_bytes().to_vec()]))
            .collect()
            .await;

        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(Error::ModelApi(msg)) if msg.contains("rate limited")));
    }
}
