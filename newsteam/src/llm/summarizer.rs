// Summarizer module: a prompt template bound to a provider
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use super::prompt::PromptTemplate;
use super::{LlmProvider, LlmRequest, LlmResponse};

/// A fixed template piped into a provider.
#[derive(Clone)]
pub struct PromptAgent {
    provider: Arc<dyn LlmProvider>,
    template: PromptTemplate,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl PromptAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, template: PromptTemplate) -> Self {
        Self {
            provider,
            template,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Per-request overrides; `None` keeps the provider defaults.
    pub fn with_limits(mut self, max_tokens: Option<usize>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub async fn invoke(&self, values: &[(&str, &str)]) -> Result<LlmResponse> {
        let prompt = self.template.render(values)?;
        debug!(prompt_chars = prompt.len(), "invoking prompt agent");

        let request = LlmRequest {
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_seconds: None,
        };
        self.provider.generate(request).await
    }
}

/// Three-sentence news summarizer.
#[derive(Clone)]
pub struct NewsSummarizer {
    agent: PromptAgent,
}

impl NewsSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            agent: PromptAgent::new(provider, PromptTemplate::news_summary()),
        }
    }

    pub fn with_limits(mut self, max_tokens: Option<usize>, temperature: Option<f32>) -> Self {
        self.agent = self.agent.with_limits(max_tokens, temperature);
        self
    }

    /// Summarize an article description. An absent description is sent as
    /// empty text rather than skipped.
    pub async fn summarize(&self, description: Option<&str>) -> Result<LlmResponse> {
        self.agent
            .invoke(&[("news", description.unwrap_or_default())])
            .await
    }
}

/// The chat persona from the console chat loop. Stateless: every question
/// is sent on its own.
#[derive(Clone)]
pub struct ChatAgent {
    agent: PromptAgent,
}

impl ChatAgent {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            agent: PromptAgent::new(provider, PromptTemplate::chat()),
        }
    }

    pub async fn ask(&self, question: &str) -> Result<String> {
        let response = self.agent.invoke(&[("question", question)]).await?;
        Ok(response.content)
    }
}
