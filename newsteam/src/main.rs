/*
newsteam - main.rs
Fetches top headlines and summarizes them with a hosted LLM. Runs the
interactive news loop by default; `chat`, `models` and `serve` select the
other shells.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{Config, LlmSettings, LlmTask, NewsSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsteam::console::{run_chat_console, run_news_console, NewsConsoleOptions};
use newsteam::llm::create_llm_provider;
use newsteam::llm::summarizer::{ChatAgent, NewsSummarizer};
use newsteam::news::NewsApiClient;
use newsteam::pipeline::NewsPipeline;
use newsteam::server::{launch_rocket, AppState};

#[derive(Parser, Debug)]
#[command(name = "newsteam", version, about = "AI news team: fetch headlines and summarize them")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive news loop (default)
    News {
        /// Country code forwarded to the news source
        #[arg(long)]
        country: Option<String>,

        /// Articles to summarize per topic
        #[arg(long, allow_hyphen_values = true)]
        count: Option<i64>,
    },
    /// Chat with the robot persona
    Chat,
    /// List the models available to the configured summarization key
    Models,
    /// Serve the web form
    Serve {
        #[arg(long)]
        bind: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the console shells own stdout
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    // API keys conventionally live in a local .env file
    if let Ok(path) = dotenv::dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    let config = load_config(args.config).await?;

    match args.command.unwrap_or(Command::News {
        country: None,
        count: None,
    }) {
        Command::News { country, count } => {
            let pipeline = build_pipeline(&config)?;
            let options = NewsConsoleOptions {
                country: country.unwrap_or_else(|| config.pipeline.country()),
                count: count.unwrap_or_else(|| config.pipeline.count()),
            };
            let stdin = BufReader::new(tokio::io::stdin());
            run_news_console(&pipeline, &options, stdin, &mut std::io::stdout()).await?;
        }
        Command::Chat => {
            let settings = LlmSettings::resolve(&config.llm, LlmTask::Chat)?;
            info!(adapter = ?settings.adapter, model = %settings.model, "chat provider initialized");
            let agent = ChatAgent::new(create_llm_provider(&settings));
            let stdin = BufReader::new(tokio::io::stdin());
            run_chat_console(&agent, stdin, &mut std::io::stdout()).await?;
        }
        Command::Models => {
            // Fails here, before any network call, when the key is missing
            let settings = LlmSettings::resolve(&config.llm, LlmTask::Summarization)?;
            let provider = create_llm_provider(&settings);
            let models = provider
                .list_models()
                .await
                .context("failed to list models")?;
            println!("Available models:");
            for model in models {
                println!("{}", model);
            }
        }
        Command::Serve { bind, port } => {
            let pipeline = build_pipeline(&config)?;
            let mut server = config.server.clone();
            server.bind = bind.or(server.bind);
            server.port = port.or(server.port);

            let state = AppState::new(pipeline, config.pipeline.country(), config.pipeline.count());
            if let Err(e) = launch_rocket(state, &server).await {
                error!(%e, "Rocket server failed");
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Layered configuration: `config.default.toml`, then `config.toml` or `--config`.
async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await?;
    info!(default_file = ?default_path, override_file = ?override_path, "configuration loaded");
    Ok(config)
}

/// Resolve both credentials up front and wire the pipeline.
fn build_pipeline(config: &Config) -> Result<NewsPipeline> {
    let news_settings = NewsSettings::resolve(&config.news)?;
    let llm_settings = LlmSettings::resolve(&config.llm, LlmTask::Summarization)?;
    info!(
        news_api = %news_settings.api_url,
        adapter = ?llm_settings.adapter,
        model = %llm_settings.model,
        "pipeline initialized"
    );

    let source = NewsApiClient::new(&news_settings)?;
    let summarizer = NewsSummarizer::new(create_llm_provider(&llm_settings));

    Ok(NewsPipeline::new(Arc::new(source), summarizer)
        .with_concurrency(config.pipeline.concurrency()))
}
