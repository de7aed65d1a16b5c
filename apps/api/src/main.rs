mod chat;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume chat API v{}", env!("CARGO_PKG_VERSION"));

    if config.provider_api_key.is_empty() {
        tracing::warn!("HUNYUAN_INTERNAL_API_KEY is not set; provider calls will fail");
    }

    // The blocking transport may not be built on an async worker thread.
    let api_key = config.provider_api_key.clone();
    let base_url = config.provider_base_url.clone();
    let llm = tokio::task::spawn_blocking(move || LlmClient::new(api_key, &base_url))
        .await
        .context("LLM client construction panicked")?
        .context("Failed to build LLM client")?;
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        llm_client::MODEL,
        llm.url()
    );

    let state = AppState {
        llm: Arc::new(llm),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
