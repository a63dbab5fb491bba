//! OpenAI-compatible HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::sse::content_stream;
use super::traits::{ChunkStream, ModelClient};
use super::types::*;

/// Client for OpenAI-compatible chat and image APIs
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    image_model: String,
    base_url: String,
    /// Whole-request limit for non-streaming calls
    timeout: Duration,
}

impl OpenAiClient {
    /// Create a new client from the model-serving configuration.
    ///
    /// `timeout_secs` bounds connecting and each idle gap between body reads,
    /// and the whole exchange for non-streaming calls. Streams may run
    /// longer as long as the upstream keeps sending.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Create with custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: &LlmConfig, base_url: impl Into<String>) -> Result<Self> {
        let base_url: String = base_url.into();
        let mut client = Self::new(config)?;
        client.base_url = base_url.trim_end_matches('/').to_string();
        Ok(client)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and return the successful response.
    ///
    /// `total` caps the whole request including the body read; streaming
    /// calls pass `None` and rely on the client's idle timeout.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        total: Option<Duration>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Sending request to model API: {}", url);

        let mut request = self.client.post(&url).bearer_auth(&self.api_key).json(body);
        if let Some(total) = total {
            request = request.timeout(total);
        }

        let response = request.send().await.map_err(Error::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Model API error: {} - {}", status, body);
            return Err(Error::ModelApi(format!("{}: {}", status, body)));
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response.text().await.map_err(Error::Http)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::ModelApi(format!("Failed to parse response: {} - {}", e, body)))
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn call(&self, prompt: Prompt) -> Result<String> {
        let request = ChatCompletionRequest::from_prompt(prompt, &self.model, false);
        let response = self
            .post("/chat/completions", &request, Some(self.timeout))
            .await?;
        let parsed: ChatCompletionResponse = Self::parse(response).await?;

        info!(
            "Model API response: model={}, tokens={}",
            parsed.model,
            parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0)
        );

        Ok(parsed.into_text())
    }

    async fn stream(&self, prompt: Prompt) -> Result<ChunkStream> {
        let request = ChatCompletionRequest::from_prompt(prompt, &self.model, true);
        debug!("Opening completion stream: model={}", request.model);

        let response = self.post("/chat/completions", &request, None).await?;
        Ok(content_stream(response.bytes_stream()))
    }

    async fn generate_image(&self, prompt: ImagePrompt) -> Result<ImageResponse> {
        let request = ImageGenerationRequest::from_prompt(prompt, &self.image_model);
        let response = self
            .post("/images/generations", &request, Some(self.timeout))
            .await?;
        let parsed: ImageResponse = Self::parse(response).await?;

        info!("Image API response: {} image(s)", parsed.data.len());

        Ok(parsed)
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
