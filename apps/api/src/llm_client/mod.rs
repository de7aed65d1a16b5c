//! LLM Client: the single point of entry for all provider calls.
//!
//! The provider speaks the Anthropic Messages API. Two transports share one
//! configuration: an async `reqwest::Client` for single-shot completions and a
//! `reqwest::blocking::Client` whose streamed body is read line by line on a
//! worker thread (see `chat::bridge`).
//!
//! Model: hunyuan-2.0-thinking (hardcoded, not configurable)
use std::io::BufReader;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod sse;

use sse::TextFragments;

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every call.
pub const MODEL: &str = "hunyuan-2.0-thinking-20251109";
/// Human-readable provider label reported by the health check.
pub const PROVIDER_LABEL: &str = "混元大模型";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider stream error: {0}")]
    Stream(String),

    #[error("Stream worker failed: {0}")]
    Worker(String),
}

impl LlmError {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Http(_) => "HttpError",
            LlmError::Api { .. } => "ApiError",
            LlmError::Parse(_) => "ParseError",
            LlmError::Io(_) => "IoError",
            LlmError::Stream(_) => "StreamError",
            LlmError::Worker(_) => "WorkerError",
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> AnthropicRequest<'a> {
    fn user(prompt: &'a str, max_tokens: u32, stream: bool) -> Self {
        Self {
            model: MODEL,
            max_tokens,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    pub model: String,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates every text block in order. Thinking and tool blocks are dropped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Picks the provider's own error message out of a non-2xx body, falling back
/// to the raw body.
fn api_error(status: u16, body: String) -> LlmError {
    let message = serde_json::from_str::<AnthropicError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Api { status, message }
}

/// A blocking sequence of text fragments from a streamed completion.
pub type TextStream = Box<dyn Iterator<Item = Result<String, LlmError>> + Send>;

/// The provider seam. `AppState` holds an `Arc<dyn CompletionProvider>` so
/// handlers can be exercised against a scripted provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Single-shot completion.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<LlmResponse, LlmError>;

    /// Streamed completion. Blocks the calling thread on network I/O; call
    /// only from a blocking-capable thread.
    fn stream_text(&self, prompt: &str, max_tokens: u32) -> Result<TextStream, LlmError>;
}

/// The production client. Cheap to clone; both inner clients are reference counted.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    blocking: reqwest::blocking::Client,
    api_key: String,
    url: String,
}

impl LlmClient {
    /// Builds both transports. Must run on a thread that may block: the
    /// blocking client owns its own runtime and may not be created from
    /// inside an async task.
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), MESSAGES_PATH);
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            blocking: reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()?,
            api_key,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&AnthropicRequest::user(prompt, max_tokens, false))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), body));
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }

    fn stream_text(&self, prompt: &str, max_tokens: u32) -> Result<TextStream, LlmError> {
        let response = self
            .blocking
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("accept", "text/event-stream")
            .json(&AnthropicRequest::user(prompt, max_tokens, true))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(api_error(status.as_u16(), body));
        }

        debug!("LLM stream opened: status={status}");
        Ok(Box::new(TextFragments::new(BufReader::new(response))))
    }
}
