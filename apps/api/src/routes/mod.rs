pub mod health;
pub mod page;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::chat::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(page::index_handler))
        .route("/api/health", get(health::health_handler))
        .route("/api/chat", post(handlers::handle_chat))
        .route("/api/chat_sync", post(handlers::handle_chat_sync))
        .nest_service("/static", static_files)
        .with_state(state)
}
