//! Prompt, option and wire types for OpenAI-compatible APIs

use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged text message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }
}

/// Per-request chat options. Unset fields fall back to the client/API defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub frequency_penalty: Option<f64>,
}

impl ChatOptions {
    pub fn builder() -> ChatOptionsBuilder {
        ChatOptionsBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ChatOptionsBuilder {
    options: ChatOptions,
}

impl ChatOptionsBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn frequency_penalty(mut self, frequency_penalty: f64) -> Self {
        self.options.frequency_penalty = Some(frequency_penalty);
        self
    }

    pub fn build(self) -> ChatOptions {
        self.options
    }
}

/// Messages plus options for one chat call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prompt {
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl Prompt {
    pub fn new(messages: Vec<Message>, options: ChatOptions) -> Self {
        Self { messages, options }
    }

    /// Single user message with default options
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(vec![Message::user(text)], ChatOptions::default())
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

/// Image generation options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageOptions {
    pub model: Option<String>,
    pub quality: Option<String>,
    pub n: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub response_format: Option<String>,
}

impl ImageOptions {
    pub fn builder() -> ImageOptionsBuilder {
        ImageOptionsBuilder::default()
    }

    /// `"{width}x{height}"` when both dimensions are set
    pub fn size(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ImageOptionsBuilder {
    options: ImageOptions,
}

impl ImageOptionsBuilder {
    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.options.quality = Some(quality.into());
        self
    }

    pub fn n(mut self, n: u32) -> Self {
        self.options.n = Some(n);
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.options.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.options.height = Some(height);
        self
    }

    pub fn build(self) -> ImageOptions {
        self.options
    }
}

/// Instructions plus options for one image call
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePrompt {
    pub instructions: String,
    pub options: ImageOptions,
}

impl ImagePrompt {
    pub fn new(instructions: impl Into<String>, options: ImageOptions) -> Self {
        Self {
            instructions: instructions.into(),
            options,
        }
    }
}

/// Image generation result, relayed to callers as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

// ============================================================================
// Wire types
// ============================================================================

/// `POST /chat/completions` body
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Map a prompt onto the wire format, using `default_model` when the
    /// prompt does not pick one
    pub fn from_prompt(prompt: Prompt, default_model: &str, stream: bool) -> Self {
        let Prompt { messages, options } = prompt;
        Self {
            model: options.model.unwrap_or_else(|| default_model.to_string()),
            messages,
            temperature: options.temperature,
            frequency_penalty: options.frequency_penalty,
            stream,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl ChatCompletionResponse {
    /// Content of the first choice (empty when the API returned none)
    pub fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Content delta of the first choice, if non-empty
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// `POST /images/generations` body
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
}

impl ImageGenerationRequest {
    pub fn from_prompt(prompt: ImagePrompt, default_model: &str) -> Self {
        let size = prompt.options.size();
        let ImageOptions {
            model,
            quality,
            n,
            response_format,
            ..
        } = prompt.options;

        Self {
            model: model.unwrap_or_else(|| default_model.to_string()),
            prompt: prompt.instructions,
            n,
            size,
            quality,
            response_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let msg = Message::assistant("Hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "Hello"}));
    }

    #[test]
    fn test_request_omits_unset_options() {
        let request = ChatCompletionRequest::from_prompt(Prompt::user("Hi"), "gpt-4o-mini", false);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hi"}],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_forwards_options() {
        let options = ChatOptions::builder()
            .model("deepseek-ai/DeepSeek-R1-Distill-Qwen-7B")
            .temperature(0.3)
            .frequency_penalty(1.5)
            .build();
        let request = ChatCompletionRequest::from_prompt(
            Prompt::user("Hi").with_options(options),
            "gpt-4o-mini",
            true,
        );

        assert_eq!(request.model, "deepseek-ai/DeepSeek-R1-Distill-Qwen-7B");
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.frequency_penalty, Some(1.5));
        assert!(request.stream);
    }

    #[test]
    fn test_response_into_text() {
        let body = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Why did the chicken..."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
        });
        let response: ChatCompletionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.usage.as_ref().map(|u| u.total_tokens), Some(12));
        assert_eq!(response.into_text(), "Why did the chicken...");
    }

    #[test]
    fn test_response_without_choices_is_empty_text() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(response.into_text(), "");
    }

    #[test]
    fn test_chunk_content() {
        let chunk: ChatCompletionChunk =
            serde_json::from_value(json!({"choices": [{"delta": {"content": "Hel"}}]})).unwrap();
        assert_eq!(chunk.content(), Some("Hel"));

        let role_only: ChatCompletionChunk =
            serde_json::from_value(json!({"choices": [{"delta": {"role": "assistant"}}]})).unwrap();
        assert_eq!(role_only.content(), None);

        let empty: ChatCompletionChunk =
            serde_json::from_value(json!({"choices": [{"delta": {"content": ""}}]})).unwrap();
        assert_eq!(empty.content(), None);
    }

    #[test]
    fn test_image_request_mapping() {
        let options = ImageOptions::builder()
            .quality("hd")
            .n(1)
            .height(1024)
            .width(1024)
            .build();
        let request = ImageGenerationRequest::from_prompt(ImagePrompt::new("a cat", options), "dall-e-3");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "dall-e-3",
                "prompt": "a cat",
                "n": 1,
                "size": "1024x1024",
                "quality": "hd"
            })
        );
    }

    #[test]
    fn test_image_size_requires_both_dimensions() {
        let options = ImageOptions::builder().width(512).build();
        assert_eq!(options.size(), None);
    }

    #[test]
    fn test_image_response_roundtrip_shape() {
        let body = json!({
            "created": 1700000000,
            "data": [{"url": "https://img.test/1.png", "revised_prompt": "a fluffy cat"}]
        });
        let response: ImageResponse = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(serde_json::to_value(&response).unwrap(), body);
    }
}
