use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use super::handlers;
use super::static_files::static_handler;
use super::state::AppState;

// UI Routes - web interface
pub fn ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::ui::index_handler))
        .route("/static/{*path}", get(static_handler))
}

// API Routes - REST API for programmatic access
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            // Schema introspection
            .route("/databases", get(handlers::api::list_databases))
            .route("/databases/{db}/tables", get(handlers::api::list_tables))
            .route("/tables/{table}/columns", get(handlers::api::list_columns))
            // Generation pipeline
            .route("/generate", post(handlers::api::generate))
            .route("/validate", post(handlers::api::validate))
            .route("/execute", post(handlers::api::execute))
            .route(
                "/generate-and-execute",
                post(handlers::api::generate_and_execute),
            )
            .route("/explain", post(handlers::api::explain))
            .route("/optimize", post(handlers::api::optimize))
            // Process introspection
            .route("/health", get(handlers::api::health))
            .route("/llm/info", get(handlers::api::llm_info)),
    )
}
