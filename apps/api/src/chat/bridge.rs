//! Streaming Bridge: relays a blocking provider stream to an async SSE response.
//!
//! # Architecture
//! - `spawn_stream_bridge` creates a per-request unbounded channel and starts one
//!   worker on tokio's blocking pool via `spawn_blocking`.
//! - The worker iterates the provider's blocking `TextStream` and sends one
//!   `ChunkEvent::Text` per fragment, then exactly one terminal event
//!   (`Done` or `Error`). `UnboundedSender::send` never blocks and wakes the
//!   receiving task, so it is safe to call from the worker thread.
//! - `sse_events` is the consumer side: it awaits the channel (suspending only the
//!   request task) and ends right after the first terminal event.
//!
//! # Ordering
//! One producer, one consumer, FIFO channel: fragments reach the client in the
//! order the provider produced them. If the worker dies without sending a terminal
//! event the consumer synthesises an `Error`, so every stream ends with exactly one
//! terminal frame.
//!
//! # Lifetime
//! No timeout. When the client disconnects the receiver is dropped, the next
//! `send` fails, and the worker stops reading; a provider read already in flight
//! is not interrupted.

use std::sync::Arc;

use futures::stream::{self, Stream};
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, Span};

use crate::llm_client::{CompletionProvider, LlmError};

/// Prefix of the message carried by an error frame.
pub const ERROR_PREFIX: &str = "调用失败";

/// One event in a per-request stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    Text(String),
    Done,
    Error(String),
}

impl ChunkEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChunkEvent::Text(_))
    }

    /// The `data:` payload of the SSE frame for this event.
    pub fn frame_data(&self) -> String {
        match self {
            ChunkEvent::Text(fragment) => json!({ "content": fragment }).to_string(),
            ChunkEvent::Done => "[DONE]".to_string(),
            ChunkEvent::Error(message) => {
                json!({ "error": format!("{ERROR_PREFIX}: {message}") }).to_string()
            }
        }
    }
}

enum Delivery {
    Complete,
    ReceiverGone,
}

/// Starts the blocking stream for `prompt` on a worker thread and returns the
/// receiving end of its event channel.
///
/// Must be called from inside a tokio runtime. The worker inherits the caller's
/// tracing span.
pub fn spawn_stream_bridge(
    provider: Arc<dyn CompletionProvider>,
    prompt: String,
    max_tokens: u32,
) -> UnboundedReceiver<ChunkEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    let span = Span::current();

    // Detached: the receiver observes the outcome.
    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        run_worker(provider.as_ref(), &prompt, max_tokens, &tx);
    });

    rx
}

fn run_worker(
    provider: &dyn CompletionProvider,
    prompt: &str,
    max_tokens: u32,
    tx: &UnboundedSender<ChunkEvent>,
) {
    let terminal = match forward_fragments(provider, prompt, max_tokens, tx) {
        Ok(Delivery::Complete) => ChunkEvent::Done,
        Ok(Delivery::ReceiverGone) => {
            debug!("Stream consumer dropped; stopping worker");
            return;
        }
        Err(e) => {
            error!("Stream error: {}: {e}", e.kind());
            ChunkEvent::Error(e.to_string())
        }
    };
    // A failed send means the consumer is gone; nothing is left to notify.
    let _ = tx.send(terminal);
}

fn forward_fragments(
    provider: &dyn CompletionProvider,
    prompt: &str,
    max_tokens: u32,
    tx: &UnboundedSender<ChunkEvent>,
) -> Result<Delivery, LlmError> {
    for fragment in provider.stream_text(prompt, max_tokens)? {
        if tx.send(ChunkEvent::Text(fragment?)).is_err() {
            return Ok(Delivery::ReceiverGone);
        }
    }
    Ok(Delivery::Complete)
}

/// Consumer side of the bridge: yields events until, and including, the first
/// terminal event.
pub fn sse_events(rx: UnboundedReceiver<ChunkEvent>) -> impl Stream<Item = ChunkEvent> {
    stream::unfold(Some(rx), |state| async move {
        let Some(mut rx) = state else {
            return None;
        };
        let event = match rx.recv().await {
            Some(event) => event,
            None => {
                let e = LlmError::Worker("exited without a terminal event".to_string());
                error!("Stream error: {}: {e}", e.kind());
                ChunkEvent::Error(e.to_string())
            }
        };
        let next = if event.is_terminal() { None } else { Some(rx) };
        Some((event, next))
    })
}
