use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::SuggestionMode;
use crate::db::executor::{Row, static_suggestion};
use crate::llm::models::LlmInfo;
use crate::sql::validate::validate_sql;
use crate::web::state::AppState;

// Request/response types

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct DatabasesResponse {
    pub databases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnsParams {
    pub database: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub nl_query: String,
    pub database: Option<String>,
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub sql_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SqlRequest {
    pub sql_query: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub results: Vec<Row>,
    pub row_count: usize,
    pub optimization_suggestion: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateAndExecuteResponse {
    pub sql_query: String,
    pub results: Vec<Row>,
    pub row_count: usize,
    pub optimization_suggestion: String,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub optimization_suggestions: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: i64,
    pub database: &'static str,
}

// Schema introspection

pub async fn list_databases(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatabasesResponse>, ApiError> {
    let introspector = state.introspector.clone();
    let listing = tokio::task::spawn_blocking(move || introspector.list_databases())
        .await
        .map_err(internal)?;

    Ok(Json(DatabasesResponse {
        databases: listing.names,
        error: listing.error,
    }))
}

pub async fn list_tables(
    State(state): State<Arc<AppState>>,
    Path(database): Path<String>,
) -> Result<Json<TablesResponse>, ApiError> {
    let introspector = state.introspector.clone();
    let listing = tokio::task::spawn_blocking(move || introspector.list_tables(&database))
        .await
        .map_err(internal)?;

    Ok(Json(TablesResponse {
        tables: listing.names,
        error: listing.error,
    }))
}

pub async fn list_columns(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(params): Query<ColumnsParams>,
) -> Result<Json<ColumnsResponse>, ApiError> {
    let introspector = state.introspector.clone();
    let listing = tokio::task::spawn_blocking(move || {
        introspector.list_columns(&table, params.database.as_deref())
    })
    .await
    .map_err(internal)?;

    Ok(Json(ColumnsResponse {
        columns: listing.names,
        error: listing.error,
    }))
}

// Generation pipeline

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    info!("Generating SQL for request: {}", payload.nl_query);

    let sql = generate_sql(&state, &payload.nl_query, payload.database.as_deref()).await?;

    // Explanation failure degrades to None, it never fails the request
    let explanation = if payload.explain {
        state.llm.explain_sql(&sql).await.ok()
    } else {
        None
    };

    Ok(Json(GenerateResponse {
        sql_query: sql,
        explanation,
    }))
}

pub async fn validate(Json(payload): Json<SqlRequest>) -> Json<crate::sql::validate::ValidationOutcome> {
    Json(validate_sql(&payload.sql_query))
}

pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SqlRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    info!("Executing SQL query: {}", payload.sql_query);
    let response = run_execution(&state, payload.sql_query).await?;
    Ok(Json(response))
}

pub async fn generate_and_execute(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateAndExecuteResponse>, ApiError> {
    info!("Generate-and-execute for request: {}", payload.nl_query);

    let sql = generate_sql(&state, &payload.nl_query, payload.database.as_deref()).await?;
    let executed = run_execution(&state, sql.clone()).await?;

    Ok(Json(GenerateAndExecuteResponse {
        sql_query: sql,
        results: executed.results,
        row_count: executed.row_count,
        optimization_suggestion: executed.optimization_suggestion,
    }))
}

pub async fn explain(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SqlRequest>,
) -> Json<ExplainResponse> {
    let explanation = state
        .llm
        .explain_sql(&payload.sql_query)
        .await
        .unwrap_or_else(|e| format!("Could not explain query: {}", e));

    Json(ExplainResponse { explanation })
}

pub async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SqlRequest>,
) -> Json<OptimizeResponse> {
    let suggestions = optimization_suggestion(&state, &payload.sql_query).await;
    Json(OptimizeResponse {
        optimization_suggestions: suggestions,
    })
}

// Process introspection

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let pool = state.db_pool.clone();
    let database_ok = tokio::task::spawn_blocking(move || {
        pool.get()
            .map_err(|e| e.to_string())
            .and_then(|conn| conn.execute("SELECT 1", []).map_err(|e| e.to_string()))
            .is_ok()
    })
    .await
    .unwrap_or(false);

    let uptime = chrono::Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds();

    Json(HealthResponse {
        status: if database_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        database: if database_ok { "ok" } else { "unreachable" },
    })
}

pub async fn llm_info(State(state): State<Arc<AppState>>) -> Json<LlmInfo> {
    Json(state.llm.info())
}

// Pipeline helpers

/// Snapshot the schema, build the prompt, call the completion endpoint and
/// normalize the output. Upstream failures surface as a generation failure,
/// never as a propagated transport error.
async fn generate_sql(
    state: &Arc<AppState>,
    nl_query: &str,
    database: Option<&str>,
) -> Result<String, ApiError> {
    let introspector = state.introspector.clone();
    let database = database.map(|s| s.to_string());
    let snapshot =
        tokio::task::spawn_blocking(move || introspector.limited_schema(database.as_deref()))
            .await
            .map_err(internal)?;

    let schema_text = crate::llm::prompt::render_schema(&snapshot);

    state
        .llm
        .generate_sql(nl_query, &schema_text)
        .await
        .map_err(|e| {
            error!("SQL generation failed: {}", e);
            api_error(
                StatusCode::BAD_GATEWAY,
                format!("Failed to generate SQL query: {}", e),
            )
        })
}

/// Validate, execute on one connection, then produce an optimization
/// suggestion via EXPLAIN on a second connection. Suggestion failures
/// degrade to a fallback string; a successful execution is always returned.
async fn run_execution(state: &Arc<AppState>, sql: String) -> Result<ExecuteResponse, ApiError> {
    let outcome = validate_sql(&sql);
    if !outcome.valid {
        let message = outcome.error.unwrap_or_else(|| "Invalid SQL syntax".to_string());
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid SQL query: {}", message),
        ));
    }

    let executor = state.executor.clone();
    let sql_to_execute = sql.clone();
    let executed = tokio::task::spawn_blocking(move || executor.run_query(&sql_to_execute))
        .await
        .map_err(internal)?;

    let (results, row_count) = executed.map_err(|e| {
        error!("Failed to execute SQL query: {}", e);
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Failed to execute SQL query: {}", e),
        )
    })?;

    let optimization_suggestion = optimization_suggestion(state, &sql).await;

    Ok(ExecuteResponse {
        results,
        row_count,
        optimization_suggestion,
    })
}

/// EXPLAIN on its own scoped connection, then either a static heuristic or
/// a completion call over the plan, depending on configuration.
async fn optimization_suggestion(state: &Arc<AppState>, sql: &str) -> String {
    let executor = state.executor.clone();
    let sql_to_explain = sql.to_string();
    let plan = match tokio::task::spawn_blocking(move || executor.explain(&sql_to_explain)).await {
        Ok(Ok(plan)) => plan,
        Ok(Err(e)) => {
            warn!("EXPLAIN failed: {}", e);
            return format!("Could not generate execution plan: {}", e);
        }
        Err(e) => {
            warn!("EXPLAIN task failed: {}", e);
            return format!("Could not generate execution plan: {}", e);
        }
    };

    match state.config.llm.suggestions {
        SuggestionMode::Static => static_suggestion(&plan),
        SuggestionMode::Llm => match state.llm.suggest_indexes(sql, &plan).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Index suggestion failed: {}", e);
                format!("Could not generate index suggestions: {}", e)
            }
        },
    }
}

fn internal(e: tokio::task::JoinError) -> ApiError {
    error!("Blocking task failed: {}", e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal task execution failed",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AppConfig, DatabaseConfig, LlmConfig, SchemaConfig, SuggestionMode, WebConfig,
    };
    use crate::db::db_pool::DuckDbConnectionManager;
    use crate::llm::LlmManager;
    use r2d2::Pool;

    fn test_state(suggestions: SuggestionMode) -> Arc<AppState> {
        let config = AppConfig {
            database: DatabaseConfig {
                path: ":memory:".to_string(),
                pool_size: 1,
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            llm: LlmConfig {
                // The ollama backend needs no credentials; these tests
                // never reach the network
                backend: "ollama".to_string(),
                model: "test-model".to_string(),
                api_key: None,
                api_url: None,
                suggestions,
            },
            schema: SchemaConfig {
                max_tables: 50,
                max_columns_per_table: 100,
            },
        };

        let pool = Pool::builder()
            .max_size(1)
            .build(DuckDbConnectionManager::new(":memory:".to_string()))
            .unwrap();
        let llm = LlmManager::new(&config.llm).unwrap();

        Arc::new(AppState::new(config, pool, llm))
    }

    #[tokio::test]
    async fn execute_select_one_returns_one_row() {
        let state = test_state(SuggestionMode::Static);
        let response = run_execution(&state, "SELECT 1;".to_string()).await.unwrap();
        assert_eq!(response.row_count, 1);
        assert_eq!(response.results.len(), 1);
        assert!(!response.optimization_suggestion.is_empty());
    }

    #[tokio::test]
    async fn invalid_syntax_is_rejected_before_execution() {
        let state = test_state(SuggestionMode::Static);
        let result = run_execution(&state, "SELEKT * FORM x".to_string()).await;
        let (status, body) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.starts_with("Invalid SQL query"));
    }

    #[tokio::test]
    async fn execution_error_maps_to_client_error() {
        let state = test_state(SuggestionMode::Static);
        let result = run_execution(&state, "SELECT * FROM missing_table;".to_string()).await;
        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn suggestion_failure_degrades_instead_of_failing() {
        let state = test_state(SuggestionMode::Llm);
        // Execution succeeds; the LLM suggestion pass cannot reach a server
        // and must fall back to an explanatory string
        let response = run_execution(&state, "SELECT 1;".to_string()).await.unwrap();
        assert_eq!(response.row_count, 1);
        assert!(
            response.optimization_suggestion.starts_with("Could not generate")
                || !response.optimization_suggestion.is_empty()
        );
    }
}
