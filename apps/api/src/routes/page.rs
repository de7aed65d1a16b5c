use axum::response::Html;

use crate::llm_client::{MODEL, PROVIDER_LABEL};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// GET /
pub async fn index_handler() -> Html<String> {
    Html(render_index())
}

fn render_index() -> String {
    INDEX_TEMPLATE
        .replace("{model}", MODEL)
        .replace("{provider}", PROVIDER_LABEL)
}
