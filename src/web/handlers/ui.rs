use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::web::state::AppState;
use crate::web::templates::render_template;

// Main UI entry point: the interactive query form, rendered with the
// active LLM configuration baked in.
pub async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let info = state.llm.info();

    let mut context = HashMap::new();
    context.insert("backend", minijinja::value::Value::from(info.backend));
    context.insert("model", minijinja::value::Value::from(info.model));
    context.insert("base_url", minijinja::value::Value::from(info.base_url));
    context.insert(
        "version",
        minijinja::value::Value::from(env!("CARGO_PKG_VERSION")),
    );

    Html(render_template(&state.template_env, "index.html", context)).into_response()
}
