pub mod models;
pub mod prompt;
pub mod providers;

use crate::config::LlmConfig;
use crate::sql::extract::extract_sql;
use async_trait::async_trait;
use models::{CompletionParams, LlmInfo};
use std::error::Error;
use std::fmt;
use tracing::debug;

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// One request/response round trip against a completion endpoint.
/// Implementations map every transport or API failure to an `LlmError`.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &CompletionParams,
    ) -> Result<String, LlmError>;

    fn base_url(&self) -> &str;

    fn uses_custom_base_url(&self) -> bool;
}

pub struct LlmManager {
    backend: Box<dyn ChatCompletion + Send + Sync>,
    backend_name: String,
    model: String,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let backend: Box<dyn ChatCompletion + Send + Sync> = match config.backend.as_str() {
            "openai" => Box::new(providers::openai::OpenAiProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )));
            }
        };

        Ok(Self {
            backend,
            backend_name: config.backend.clone(),
            model: config.model.clone(),
        })
    }

    /// Generates a candidate SQL statement for a natural-language request,
    /// normalized through the extractor. Best-effort syntactic plausibility
    /// only; validation happens downstream.
    pub async fn generate_sql(&self, nl_query: &str, schema_text: &str) -> Result<String, LlmError> {
        let (system, user) = prompt::generation_prompt(schema_text, nl_query);
        let raw = self
            .backend
            .complete(&system, &user, &CompletionParams::generation())
            .await?;
        debug!("Raw completion: {}", raw);
        Ok(extract_sql(&raw))
    }

    /// Asks the completion endpoint for a plain-English explanation.
    pub async fn explain_sql(&self, sql: &str) -> Result<String, LlmError> {
        let (system, user) = prompt::explain_prompt(sql);
        let text = self
            .backend
            .complete(&system, &user, &CompletionParams::explanation())
            .await?;
        Ok(text.trim().to_string())
    }

    /// Asks the completion endpoint for index suggestions given a plan.
    pub async fn suggest_indexes(&self, sql: &str, plan: &str) -> Result<String, LlmError> {
        let (system, user) = prompt::index_prompt(sql, plan);
        let text = self
            .backend
            .complete(&system, &user, &CompletionParams::index_suggestion())
            .await?;
        Ok(text.trim().to_string())
    }

    pub fn info(&self) -> LlmInfo {
        LlmInfo {
            backend: self.backend_name.clone(),
            model: self.model.clone(),
            base_url: self.backend.base_url().to_string(),
            using_custom_base_url: self.backend.uses_custom_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, SuggestionMode};

    fn unreachable_ollama_config() -> LlmConfig {
        LlmConfig {
            backend: "ollama".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            // Nothing listens here; requests must fail fast
            api_url: Some("http://127.0.0.1:9/api/generate".to_string()),
            suggestions: SuggestionMode::Static,
        }
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let config = LlmConfig {
            backend: "carrier-pigeon".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            api_url: None,
            suggestions: SuggestionMode::Static,
        };
        assert!(matches!(
            LlmManager::new(&config),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[test]
    fn openai_backend_requires_api_key() {
        let config = LlmConfig {
            backend: "openai".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            api_url: None,
            suggestions: SuggestionMode::Static,
        };
        assert!(matches!(
            LlmManager::new(&config),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn completion_failure_is_an_error_value_not_a_panic() {
        let manager = LlmManager::new(&unreachable_ollama_config()).unwrap();
        let result = manager.generate_sql("count the users", "shop.users: id").await;
        assert!(matches!(result, Err(LlmError::ConnectionError(_))));
    }

    #[test]
    fn info_reports_custom_base_url() {
        let manager = LlmManager::new(&unreachable_ollama_config()).unwrap();
        let info = manager.info();
        assert_eq!(info.backend, "ollama");
        assert!(info.using_custom_base_url);
    }
}
