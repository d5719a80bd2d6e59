//! Fetch-then-summarize pipeline.
//!
//! One headline request per invocation, then one summarization request per
//! article kept. With the default concurrency of 1 at most one summarization
//! request is outstanding; higher values fan out in bounded batches. Output
//! order always follows the source order.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::summarizer::NewsSummarizer;
use crate::news::{Article, NewsSource, SourceError};

/// An article together with its generated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarizedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub summary: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Non-success status from the news source, with its raw body.
    #[error("Error fetching news: {body}")]
    SourceFetch { status: u16, body: String },

    #[error("Error fetching news: {0}")]
    SourceUnavailable(#[source] SourceError),

    #[error("Error summarizing \"{title}\": {source:#}")]
    Summarization {
        title: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Status { status, body } => PipelineError::SourceFetch { status, body },
            other => PipelineError::SourceUnavailable(other),
        }
    }
}

#[derive(Clone)]
pub struct NewsPipeline {
    source: Arc<dyn NewsSource>,
    summarizer: NewsSummarizer,
    concurrency: usize,
}

impl NewsPipeline {
    pub fn new(source: Arc<dyn NewsSource>, summarizer: NewsSummarizer) -> Self {
        Self {
            source,
            summarizer,
            concurrency: 1,
        }
    }

    /// Allow up to `n` summarization requests in flight (clamped to at least 1).
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub async fn fetch_and_summarize(
        &self,
        topic: &str,
        country: &str,
        count: i64,
    ) -> Result<Vec<SummarizedArticle>, PipelineError> {
        if count <= 0 {
            return Ok(Vec::new());
        }

        let mut articles = self.source.top_headlines(topic, country).await?;
        let available = articles.len();
        articles.truncate(usize::try_from(count).unwrap_or(usize::MAX));
        info!(
            %topic,
            %country,
            requested = count,
            available,
            kept = articles.len(),
            "summarizing headlines"
        );

        // buffered() yields in input order regardless of completion order
        let summarized = stream::iter(articles)
            .map(|article| self.summarize_one(article))
            .buffered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        info!(%topic, count = summarized.len(), "pipeline complete");
        Ok(summarized)
    }

    async fn summarize_one(&self, article: Article) -> Result<SummarizedArticle, PipelineError> {
        match self.summarizer.summarize(article.description.as_deref()).await {
            Ok(response) => Ok(SummarizedArticle {
                article,
                summary: response.content,
            }),
            Err(e) => {
                warn!(title = %article.title, error = %e, "summarization failed");
                Err(PipelineError::Summarization {
                    title: article.title,
                    source: e,
                })
            }
        }
    }
}
