//! Test utilities and mock factories.
//!
//! `ScriptedProvider` stands in for the provider client so handlers and the
//! streaming bridge can be exercised without a network. Only compiled in test builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::llm_client::{CompletionProvider, ContentBlock, LlmError, LlmResponse, TextStream, Usage};
use crate::state::AppState;

/// What `stream_text` does.
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Yields the fragments, then ends normally.
    Fragments(Vec<String>),
    /// Yields the fragments, then one in-stream error.
    FailAfter(Vec<String>, String),
    /// Fails before producing anything.
    FailToOpen(String),
    /// Yields each character of the question (the text after the last
    /// `用户问题：` marker), pausing briefly between fragments.
    EchoQuestion,
    /// Panics inside the worker.
    Panic,
}

impl StreamScript {
    pub fn fragments(fragments: &[&str]) -> Self {
        StreamScript::Fragments(fragments.iter().map(|f| f.to_string()).collect())
    }
}

pub struct ScriptedProvider {
    stream: StreamScript,
    completion: Result<LlmResponse, String>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn streaming(stream: StreamScript) -> Self {
        Self {
            stream,
            completion: Ok(mock_response(&[("text", "ok")])),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn completing(response: LlmResponse) -> Self {
        Self {
            stream: StreamScript::Fragments(Vec::new()),
            completion: Ok(response),
            calls: AtomicUsize::new(0),
        }
    }

    /// Both entry points fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            stream: StreamScript::FailToOpen(message.to_string()),
            completion: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of provider calls made so far, streaming or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn unavailable(message: &str) -> LlmError {
    LlmError::Api {
        status: 503,
        message: message.to_string(),
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.completion.clone().map_err(|m| unavailable(&m))
    }

    fn stream_text(&self, prompt: &str, _max_tokens: u32) -> Result<TextStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.stream {
            StreamScript::Fragments(fragments) => {
                Ok(Box::new(fragments.clone().into_iter().map(Ok::<_, LlmError>)))
            }
            StreamScript::FailAfter(fragments, message) => {
                let error = LlmError::Stream(message.clone());
                Ok(Box::new(
                    fragments
                        .clone()
                        .into_iter()
                        .map(Ok)
                        .chain(std::iter::once(Err(error))),
                ))
            }
            StreamScript::FailToOpen(message) => Err(unavailable(message)),
            StreamScript::EchoQuestion => {
                let question = prompt.rsplit("用户问题：").next().unwrap_or_default();
                let fragments: Vec<String> = question.chars().map(String::from).collect();
                Ok(Box::new(fragments.into_iter().map(|f| {
                    std::thread::sleep(Duration::from_millis(2));
                    Ok::<_, LlmError>(f)
                })))
            }
            StreamScript::Panic => panic!("scripted provider panic"),
        }
    }
}

/// Builds a provider response from `(block_type, text)` pairs.
pub fn mock_response(blocks: &[(&str, &str)]) -> LlmResponse {
    LlmResponse {
        model: "hunyuan-test".to_string(),
        content: blocks
            .iter()
            .map(|(block_type, text)| ContentBlock {
                block_type: block_type.to_string(),
                text: Some(text.to_string()),
            })
            .collect(),
        usage: Usage::default(),
    }
}

pub fn mock_config() -> Config {
    Config {
        provider_api_key: String::new(),
        provider_base_url: "http://127.0.0.1:9".to_string(),
        static_dir: "static".to_string(),
        port: 0,
        rust_log: "info".to_string(),
    }
}

pub fn mock_state(provider: Arc<ScriptedProvider>) -> AppState {
    AppState {
        llm: provider,
        config: mock_config(),
    }
}
