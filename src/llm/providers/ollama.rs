use crate::config::LlmConfig;
use crate::llm::models::CompletionParams;
use crate::llm::{ChatCompletion, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const DEFAULT_API_URL: &str = "http://localhost:11434/api/generate";

/// Provider for a local Ollama instance. Ollama's generate endpoint takes a
/// single prompt string, so the system and user messages are concatenated.
pub struct OllamaProvider {
    client: reqwest::Client,
    api_url: String,
    custom_base_url: bool,
    model: String,
}

#[derive(Serialize, Debug)]
struct OllamaRequest {
    model: String,
    prompt: String,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
    // Ignore whatever else the server includes
    #[serde(flatten)]
    _extra: std::collections::HashMap<String, serde_json::Value>,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let custom_base_url = config.api_url.is_some();
        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let client = reqwest::Client::new();

        Ok(Self {
            client,
            api_url,
            custom_base_url,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatCompletion for OllamaProvider {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: format!("{}\n\n{}", system, user),
            temperature: params.temperature,
            stream: false, // Explicitly disable streaming
        };

        debug!("Sending request to Ollama: {:?}", request);

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = match response.text().await {
                Ok(body) => format!(" - Response body: {}", body),
                Err(_) => String::new(),
            };

            error!("Ollama API responded with status code: {}{}", status, error_body);
            return Err(LlmError::ResponseError(format!(
                "Ollama API responded with status code: {}{}",
                status, error_body
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseError(format!("Failed to read response body: {}", e)))?;

        let ollama_response: OllamaResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!(
                    "Failed to parse Ollama response: {} - Response was: {}",
                    e, response_text
                );
                LlmError::ResponseError(format!("Failed to parse Ollama response: {}", e))
            })?;

        Ok(ollama_response.response.trim().to_string())
    }

    fn base_url(&self) -> &str {
        &self.api_url
    }

    fn uses_custom_base_url(&self) -> bool {
        self.custom_base_url
    }
}
