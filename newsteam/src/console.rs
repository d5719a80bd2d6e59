//! Interactive console loops: the news team and the chat persona.
//!
//! Both loops read one line at a time and await the remote call before
//! reading the next, so `exit` is only seen between invocations. Errors are
//! printed as plain text and the loop keeps going.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::error;

use crate::llm::summarizer::ChatAgent;
use crate::pipeline::{NewsPipeline, SummarizedArticle};

const EXIT_SENTINEL: &str = "exit";

fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_SENTINEL)
}

/// Per-session defaults for the news loop.
#[derive(Debug, Clone)]
pub struct NewsConsoleOptions {
    pub country: String,
    pub count: i64,
}

impl Default for NewsConsoleOptions {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            count: 3,
        }
    }
}

pub async fn run_news_console<R, W>(
    pipeline: &NewsPipeline,
    options: &NewsConsoleOptions,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "Welcome to the AI News Team! Type a topic (e.g., 'technology', 'sports', 'business') or 'exit' to quit."
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "Enter a news topic: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        if is_exit(&line) {
            writeln!(out, "AI News Team: Goodbye!")?;
            break;
        }
        let topic = line.trim();
        if topic.is_empty() {
            continue;
        }

        writeln!(out, "\n🔍 Fetching latest {} news...\n", topic)?;

        match pipeline
            .fetch_and_summarize(topic, &options.country, options.count)
            .await
        {
            Ok(articles) if articles.is_empty() => {
                writeln!(out, "No {} articles found.", topic)?;
            }
            Ok(articles) => {
                for (idx, article) in articles.iter().enumerate() {
                    write_article(out, idx + 1, article)?;
                }
            }
            Err(e) => {
                error!(%topic, error = %e, "news request failed");
                writeln!(out, "{}", e)?;
            }
        }
    }

    Ok(())
}

fn write_article<W: Write>(out: &mut W, idx: usize, item: &SummarizedArticle) -> Result<()> {
    writeln!(out, "\n📰 **News {}: {}**", idx, item.article.title)?;
    writeln!(out, "🔗 Read more: {}\n", item.article.url)?;
    writeln!(out, "🤖 AI Summary: {}\n", item.summary)?;
    Ok(())
}

pub async fn run_chat_console<R, W>(agent: &ChatAgent, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "robot: Hello! Type 'exit' to quit.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        if is_exit(&line) {
            writeln!(out, "robot: Goodbye!")?;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match agent.ask(&line).await {
            Ok(answer) => writeln!(out, "robot: {}", answer)?,
            Err(e) => {
                error!(error = %e, "chat request failed");
                writeln!(out, "robot: (error) {:#}", e)?;
            }
        }
    }

    Ok(())
}
