use crate::config::AppConfig;
use crate::db::db_pool::DuckDbConnectionManager;
use crate::db::executor::QueryExecutor;
use crate::db::introspect::{SchemaIntrospector, SchemaLimits};
use crate::llm::LlmManager;
use minijinja::Environment;
use r2d2::Pool;
use std::sync::Arc;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub db_pool: Pool<DuckDbConnectionManager>,
    pub template_env: Environment<'static>,
    pub introspector: SchemaIntrospector,
    pub executor: QueryExecutor,
    pub llm: Arc<LlmManager>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db_pool: Pool<DuckDbConnectionManager>,
        llm: LlmManager,
    ) -> Self {
        let limits = SchemaLimits {
            max_tables: config.schema.max_tables,
            max_columns_per_table: config.schema.max_columns_per_table,
        };

        Self {
            config,
            introspector: SchemaIntrospector::new(db_pool.clone(), limits),
            executor: QueryExecutor::new(db_pool.clone()),
            db_pool,
            template_env: crate::web::templates::init_templates(),
            llm: Arc::new(llm),
            startup_time: chrono::Utc::now(),
        }
    }
}
