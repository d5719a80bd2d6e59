//! Web form shell.
//!
//! `GET /` shows the topic dropdown; submitting it (`POST /news`) runs the
//! pipeline once and re-renders the page with every summary inline. Nothing
//! is kept between submissions.

use std::fmt::Write as _;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::figment::Figment;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{get, post, routes, Build, FromForm, Rocket, State};
use serde::Serialize;

use common::{ServerConfig, TOPICS};

use crate::pipeline::{NewsPipeline, PipelineError, SummarizedArticle};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub pipeline: NewsPipeline,
    pub default_country: String,
    pub default_count: i64,
}

impl AppState {
    pub fn new(pipeline: NewsPipeline, default_country: impl Into<String>, default_count: i64) -> Self {
        Self {
            started_at: Utc::now(),
            pipeline,
            default_country: default_country.into(),
            default_count,
        }
    }
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    topics: Vec<&'static str>,
    default_country: String,
    default_count: i64,
}

#[derive(Debug, FromForm)]
struct NewsForm {
    topic: String,
}

/// Outcome of one form submission.
enum PageBody<'a> {
    Empty,
    Articles(&'a str, &'a [SummarizedArticle]),
    Error(&'a str, String),
}

#[get("/")]
async fn index() -> RawHtml<String> {
    RawHtml(render_page(TOPICS[0], PageBody::Empty))
}

#[post("/news", data = "<form>")]
async fn submit(state: &State<AppState>, form: Form<NewsForm>) -> RawHtml<String> {
    let topic = form.topic.trim();

    match state
        .pipeline
        .fetch_and_summarize(topic, &state.default_country, state.default_count)
        .await
    {
        Ok(articles) => RawHtml(render_page(topic, PageBody::Articles(topic, &articles))),
        Err(e) => {
            tracing::error!(%topic, error = %e, "web form request failed");
            RawHtml(render_page(topic, PageBody::Error(topic, e.to_string())))
        }
    }
}

#[get("/api/v1/news?<topic>&<country>&<count>")]
async fn news_json(
    state: &State<AppState>,
    topic: &str,
    country: Option<&str>,
    count: Option<i64>,
) -> Result<Json<Vec<SummarizedArticle>>, status::Custom<Json<serde_json::Value>>> {
    let country = country.unwrap_or(&state.default_country);
    let count = count.unwrap_or(state.default_count);

    state
        .pipeline
        .fetch_and_summarize(topic, country, count)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(%topic, error = %e, "news API request failed");
            let upstream_status = match &e {
                PipelineError::SourceFetch { status, .. } => Some(*status),
                _ => None,
            };
            status::Custom(
                Status::BadGateway,
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "upstream_status": upstream_status,
                })),
            )
        })
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/api/v1/status")]
async fn server_status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        topics: TOPICS.to_vec(),
        default_country: state.default_country.clone(),
        default_count: state.default_count,
    })
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only http(s) links are rendered as anchors.
fn safe_href(url: &str) -> Option<String> {
    let lower = url.trim_start().to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")).then(|| escape_html(url.trim()))
}

fn render_page(selected: &str, body: PageBody<'_>) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>AI News Summarizer</title>\n</head>\n<body>\n\
         <h1>📰 AI News Summarizer</h1>\n\
         <form method=\"post\" action=\"/news\">\n\
         <label for=\"topic\">Select a news category:</label>\n\
         <select id=\"topic\" name=\"topic\">\n",
    );
    for topic in TOPICS {
        let sel = if topic == selected { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{0}\"{1}>{0}</option>", topic, sel);
    }
    html.push_str("</select>\n<button type=\"submit\">Get Latest News</button>\n</form>\n");

    match body {
        PageBody::Empty => {}
        PageBody::Articles(topic, articles) => {
            let _ = writeln!(
                html,
                "<p>🔍 Latest <strong>{}</strong> news</p>",
                escape_html(topic)
            );
            if articles.is_empty() {
                html.push_str("<p>No articles found.</p>\n");
            }
            for item in articles {
                html.push_str("<article>\n");
                let _ = writeln!(html, "<h3>📰 {}</h3>", escape_html(&item.article.title));
                if let Some(href) = safe_href(&item.article.url) {
                    let _ = writeln!(
                        html,
                        "<p><a href=\"{}\" rel=\"noopener noreferrer\">Read full article</a></p>",
                        href
                    );
                }
                let _ = writeln!(
                    html,
                    "<p class=\"summary\">🤖 AI Summary: {}</p>",
                    escape_html(&item.summary)
                );
                html.push_str("</article>\n");
            }
        }
        PageBody::Error(topic, message) => {
            let _ = writeln!(
                html,
                "<p>🔍 Latest <strong>{}</strong> news</p>\n<p class=\"error\">{}</p>",
                escape_html(topic),
                escape_html(&message)
            );
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Assemble the Rocket instance; `figment` carries address/port.
pub fn build_rocket(state: AppState, figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(state)
        .mount("/", routes![index, submit, news_json, health, server_status])
}

/// Build and launch the web form server. Blocks until Rocket shuts down.
pub async fn launch_rocket(state: AppState, server: &ServerConfig) -> Result<()> {
    let mut fig = rocket::Config::figment();
    if let Some(bind) = &server.bind {
        fig = fig.merge(("address", bind.clone()));
    }
    if let Some(port) = server.port {
        fig = fig.merge(("port", port));
    }

    tracing::info!("Starting Rocket HTTP server");
    build_rocket(state, fig)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
