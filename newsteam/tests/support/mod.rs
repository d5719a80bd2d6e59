// Shared fixtures for the integration tests
#![allow(dead_code)]

use anyhow::Result;
use common::NewsSettings;
use newsteam::llm::summarizer::NewsSummarizer;
use newsteam::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use newsteam::news::NewsApiClient;
use newsteam::pipeline::NewsPipeline;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HEADLINES_PATH: &str = "/v2/top-headlines";

/// Provider that records every prompt and answers `reply to: <news>`.
#[derive(Default)]
pub struct RecordingProvider {
    prompts: Mutex<Vec<String>>,
    fail_on: Option<String>,
    // (marker, delay) pairs: prompts containing the marker are answered late
    delays: Vec<(String, Duration)>,
}

impl RecordingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every request whose prompt contains `marker`.
    pub fn failing_on(marker: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_on: Some(marker.to_string()),
            ..Default::default()
        })
    }

    pub fn with_delays(delays: &[(&str, u64)]) -> Arc<Self> {
        Arc::new(Self {
            delays: delays
                .iter()
                .map(|(m, ms)| (m.to_string(), Duration::from_millis(*ms)))
                .collect(),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for RecordingProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let prompt = request.prompt;
        self.prompts.lock().unwrap().push(prompt.clone());

        if let Some(marker) = &self.fail_on {
            if prompt.contains(marker.as_str()) {
                anyhow::bail!("upstream exploded");
            }
        }
        if let Some((_, delay)) = self.delays.iter().find(|(m, _)| prompt.contains(m.as_str())) {
            tokio::time::sleep(*delay).await;
        }

        let news = prompt.rsplit("\n\n").next().unwrap_or_default();
        Ok(LlmResponse {
            content: format!("reply to: {}", news),
            usage: UsageMetadata::default(),
            model: "recording".to_string(),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["recording".to_string()])
    }
}

pub fn news_settings(server_url: &str) -> NewsSettings {
    NewsSettings {
        api_url: format!("{}{}", server_url, HEADLINES_PATH),
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(5),
        user_agent: "newsteam-tests".to_string(),
    }
}

pub fn pipeline(server_url: &str, provider: Arc<RecordingProvider>) -> NewsPipeline {
    pipeline_with(&news_settings(server_url), provider)
}

pub fn pipeline_with(settings: &NewsSettings, provider: Arc<RecordingProvider>) -> NewsPipeline {
    let source = NewsApiClient::new(settings).expect("client");
    NewsPipeline::new(Arc::new(source), NewsSummarizer::new(provider))
}

/// NewsAPI-shaped body for `(title, description, url)` triples.
pub fn headlines_body(articles: &[(&str, Option<&str>, &str)]) -> String {
    let items: Vec<serde_json::Value> = articles
        .iter()
        .map(|(title, description, url)| {
            serde_json::json!({
                "source": { "id": null, "name": "Test Wire" },
                "author": null,
                "title": title,
                "description": description,
                "url": url,
                "urlToImage": null,
                "publishedAt": "2025-02-10T12:00:00Z",
                "content": null
            })
        })
        .collect();

    serde_json::json!({
        "status": "ok",
        "totalResults": items.len(),
        "articles": items
    })
    .to_string()
}
