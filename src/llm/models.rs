use serde::Serialize;

/// Generation parameters for one completion round trip.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: f32,
}

impl CompletionParams {
    /// Low temperature keeps SQL generation deterministic.
    pub fn generation() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1024,
            top_p: 0.95,
        }
    }

    pub fn explanation() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 512,
            top_p: 1.0,
        }
    }

    pub fn index_suggestion() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 512,
            top_p: 1.0,
        }
    }
}

/// Active completion-endpoint configuration, for the /llm/info endpoint.
#[derive(Debug, Serialize)]
pub struct LlmInfo {
    pub backend: String,
    pub model: String,
    pub base_url: String,
    pub using_custom_base_url: bool,
}
