//! Axum route handlers for the chat API.

use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};
use uuid::Uuid;

use crate::chat::bridge::{spawn_stream_bridge, sse_events};
use crate::chat::prompts::{compose_prompt, log_excerpt};
use crate::chat::CHAT_MAX_TOKENS;
use crate::errors::AppError;
use crate::llm_client::MODEL;
use crate::state::AppState;

/// Characters of the question echoed into log lines.
const LOG_QUESTION_CHARS: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatSyncResponse {
    pub content: String,
    pub model: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/chat
///
/// Streams the answer as SSE frames. Once the body is accepted the response is
/// always 200 `text/event-stream`; provider failures arrive as an error frame.
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Json(request) = payload?;

    let span = info_span!("chat_stream", stream_id = %Uuid::new_v4());
    let rx = span.in_scope(|| {
        info!(
            "Calling provider: model={MODEL}, question={}",
            log_excerpt(&request.question, LOG_QUESTION_CHARS)
        );
        spawn_stream_bridge(
            state.llm.clone(),
            compose_prompt(&request.question),
            CHAT_MAX_TOKENS,
        )
    });

    let frames = sse_events(rx)
        .map(|event| Ok::<_, Infallible>(Event::default().data(event.frame_data())));
    Ok(Sse::new(frames))
}

/// POST /api/chat_sync
///
/// Returns the whole answer at once. Only text blocks are kept.
pub async fn handle_chat_sync(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatSyncResponse>, AppError> {
    let Json(request) = payload?;

    info!(
        "Sync call: question={}",
        log_excerpt(&request.question, LOG_QUESTION_CHARS)
    );

    let response = state
        .llm
        .complete(&compose_prompt(&request.question), CHAT_MAX_TOKENS)
        .await?;

    Ok(Json(ChatSyncResponse {
        content: response.text(),
        model: response.model,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_requires_question() {
        let missing: Result<ChatRequest, _> = serde_json::from_str(r#"{"q": "hi"}"#);
        assert!(missing.is_err());

        let wrong_type: Result<ChatRequest, _> = serde_json::from_str(r#"{"question": 42}"#);
        assert!(wrong_type.is_err());
    }

    #[test]
    fn test_chat_request_accepts_empty_question() {
        let request: ChatRequest = serde_json::from_str(r#"{"question": ""}"#).unwrap();
        assert_eq!(request.question, "");
    }
}
