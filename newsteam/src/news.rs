use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use common::NewsSettings;

/// One headline item from the news source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source answered with a non-success status; `body` is the raw payload.
    #[error("news source returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, timeout or body-read failure. The request URL (which
    /// carries the API key) is stripped before the error is stored.
    #[error("news source request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("news source response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SourceError {
    fn transport(err: reqwest::Error) -> Self {
        SourceError::Transport(err.without_url())
    }
}

/// Headlines-by-category provider.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Top headlines for `topic` in `country`, in source order.
    async fn top_headlines(&self, topic: &str, country: &str) -> Result<Vec<Article>, SourceError>;
}

/// NewsAPI `top-headlines` client.
pub struct NewsApiClient {
    api_url: String,
    api_key: String,
    client: Client,
}

impl NewsApiClient {
    pub fn new(settings: &NewsSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build reqwest client: {}", e))?;

        Ok(Self {
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsApiClient {
    async fn top_headlines(&self, topic: &str, country: &str) -> Result<Vec<Article>, SourceError> {
        info!(%topic, %country, "fetching top headlines");

        // topic and country are forwarded verbatim; the source validates them
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("country", country),
                ("category", topic),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(SourceError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(SourceError::transport)?;

        if !status.is_success() {
            warn!(%status, %topic, "news source returned an error status");
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: HeadlinesResponse = serde_json::from_str(&body)?;
        info!(count = parsed.articles.len(), %topic, "fetched top headlines");
        Ok(parsed.articles)
    }
}
