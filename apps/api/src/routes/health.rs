use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::error;

use crate::llm_client::{MODEL, PROVIDER_LABEL};
use crate::state::AppState;

const PROBE_PROMPT: &str = "hi";
const PROBE_MAX_TOKENS: u32 = 10;

/// GET /api/health
/// Probes the provider with a tiny completion. Always 200: a failed probe is
/// reported as `api_note`, not as an unhealthy status.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let mut body = json!({
        "status": "ok",
        "model": MODEL,
        "provider": PROVIDER_LABEL
    });

    if let Err(e) = state.llm.complete(PROBE_PROMPT, PROBE_MAX_TOKENS).await {
        error!("Health check error: {e}");
        body["api_note"] = Value::String(e.to_string());
    }

    Json(body)
}
