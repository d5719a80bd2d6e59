use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use common::{LlmAdapter, LlmSettings};

pub mod gemini;
pub mod prompt;
pub mod remote;
pub mod summarizer;

/// Core trait for summarization-service adapters
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Names of the models the service exposes to this key
    async fn list_models(&self) -> Result<Vec<String>>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

/// Response from LLM generation. `content` is always present; adapters
/// return an error instead of an empty or unrecognized payload.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Body of a non-2xx response, for the error message. Bounded by `timeout`;
/// a stalled or unreadable body yields an empty string.
pub(crate) async fn error_body(response: reqwest::Response, timeout: Duration) -> String {
    match tokio::time::timeout(timeout, response.text()).await {
        Ok(Ok(body)) => body,
        _ => String::new(),
    }
}

/// Build the adapter selected by resolved settings.
pub fn create_llm_provider(settings: &LlmSettings) -> Arc<dyn LlmProvider> {
    match settings.adapter {
        LlmAdapter::Gemini => Arc::new(
            gemini::GeminiProvider::new(&settings.api_url, &settings.api_key, &settings.model)
                .with_defaults(settings.timeout.as_secs(), settings.max_tokens, settings.temperature),
        ),
        LlmAdapter::Remote => Arc::new(
            remote::RemoteLlmProvider::new(&settings.api_url, &settings.api_key, &settings.model)
                .with_defaults(settings.timeout.as_secs(), settings.max_tokens, settings.temperature),
        ),
    }
}
