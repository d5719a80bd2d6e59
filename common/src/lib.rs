/*!
common/src/lib.rs

Shared configuration types for newsteam.

This file provides:
- Config data structures (deserialized from TOML)
- Layered loading of a default file and an override file
- Credential resolution: API keys are read from the environment once, at
  start-up, and handed to the clients as resolved settings
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2/top-headlines";
pub const DEFAULT_NEWS_API_KEY_ENV: &str = "NEWS_API_KEY";

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-latest";

pub const DEFAULT_REMOTE_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_REMOTE_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-4o-mini";

/// Topics offered by the web form dropdown.
pub const TOPICS: [&str; 7] = [
    "technology",
    "business",
    "sports",
    "health",
    "science",
    "entertainment",
    "general",
];

/// News source section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Full URL of the top-headlines endpoint
    pub api_url: Option<String>,
    /// Name of the environment variable holding the news API key
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

/// One summarization-service endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmEndpointConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
}

/// LLM top-level config grouping the task-specific endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub adapter: Option<String>, // "gemini", "remote"
    pub summarization: Option<LlmEndpointConfig>,
    // Falls back to `summarization` when absent
    pub chat: Option<LlmEndpointConfig>,
}

/// Fetch-and-summarize defaults used by the shells
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub default_country: Option<String>,
    pub default_count: Option<i64>,
    pub summarize_concurrency: Option<usize>,
}

impl PipelineConfig {
    pub fn country(&self) -> String {
        self.default_country.clone().unwrap_or_else(|| "us".to_string())
    }

    pub fn count(&self) -> i64 {
        self.default_count.unwrap_or(3)
    }

    /// Number of summarization requests allowed in flight; never below 1.
    pub fn concurrency(&self) -> usize {
        self.summarize_concurrency.unwrap_or(1).max(1)
    }
}

/// Web form server section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing files
    /// are skipped, so with neither present every section falls back to its defaults.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// Which summarization API the endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmAdapter {
    /// Google Generative Language `generateContent`
    Gemini,
    /// OpenAI-compatible `chat/completions`
    Remote,
}

impl LlmAdapter {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(LlmAdapter::Gemini),
            "remote" | "openai" => Ok(LlmAdapter::Remote),
            other => bail!("Unknown LLM adapter type: {}", other),
        }
    }

    fn default_api_url(self) -> &'static str {
        match self {
            LlmAdapter::Gemini => DEFAULT_GEMINI_API_URL,
            LlmAdapter::Remote => DEFAULT_REMOTE_API_URL,
        }
    }

    fn default_api_key_env(self) -> &'static str {
        match self {
            LlmAdapter::Gemini => DEFAULT_GEMINI_API_KEY_ENV,
            LlmAdapter::Remote => DEFAULT_REMOTE_API_KEY_ENV,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            LlmAdapter::Gemini => DEFAULT_GEMINI_MODEL,
            LlmAdapter::Remote => DEFAULT_REMOTE_MODEL,
        }
    }
}

/// Task an LLM endpoint is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmTask {
    Summarization,
    Chat,
}

/// Resolved, validated summarization-service settings.
#[derive(Clone)]
pub struct LlmSettings {
    pub adapter: LlmAdapter,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_tokens: usize,
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("adapter", &self.adapter)
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmSettings {
    /// Resolve the endpoint for `task`, reading the API key from the process environment.
    pub fn resolve(config: &LlmConfig, task: LlmTask) -> Result<Self> {
        Self::resolve_with(config, task, |name| std::env::var(name).ok())
    }

    /// Same as [`LlmSettings::resolve`] with an injectable variable lookup.
    pub fn resolve_with<F>(config: &LlmConfig, task: LlmTask, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let adapter = LlmAdapter::parse(config.adapter.as_deref().unwrap_or("gemini"))?;

        let endpoint = match task {
            LlmTask::Summarization => config.summarization.clone(),
            LlmTask::Chat => config.chat.clone().or_else(|| config.summarization.clone()),
        }
        .unwrap_or_default();

        let api_url = endpoint
            .api_url
            .unwrap_or_else(|| adapter.default_api_url().to_string());
        url::Url::parse(&api_url)
            .with_context(|| format!("Invalid LLM api_url: {}", api_url))?;

        let key_env = endpoint
            .api_key_env
            .unwrap_or_else(|| adapter.default_api_key_env().to_string());
        let api_key = require_env(&key_env, &lookup)?;

        Ok(Self {
            adapter,
            api_url,
            api_key,
            model: endpoint
                .model
                .unwrap_or_else(|| adapter.default_model().to_string()),
            temperature: endpoint.temperature.unwrap_or(0.7),
            timeout: Duration::from_secs(endpoint.timeout_seconds.unwrap_or(30)),
            max_tokens: endpoint.max_tokens.unwrap_or(512),
        })
    }
}

/// Resolved, validated news-source settings.
#[derive(Clone)]
pub struct NewsSettings {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl fmt::Debug for NewsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl NewsSettings {
    pub fn resolve(config: &NewsConfig) -> Result<Self> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(config: &NewsConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_NEWS_API_URL.to_string());
        url::Url::parse(&api_url)
            .with_context(|| format!("Invalid news api_url: {}", api_url))?;

        let key_env = config
            .api_key_env
            .clone()
            .unwrap_or_else(|| DEFAULT_NEWS_API_KEY_ENV.to_string());
        let api_key = require_env(&key_env, &lookup)?;

        Ok(Self {
            api_url,
            api_key,
            timeout: Duration::from_secs(config.timeout_seconds.unwrap_or(15)),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(|| format!("newsteam/{}", env!("CARGO_PKG_VERSION"))),
        })
    }
}

fn require_env<F>(name: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Some(_) => bail!("{} is set but empty. Check your .env file.", name),
        None => bail!("{} is not set. Check your .env file.", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn config_from_string() {
        let toml = r#"
            [news]
            api_key_env = "MY_NEWS_KEY"

            [llm]
            adapter = "remote"

            [llm.summarization]
            model = "gpt-4o-mini"
            max_tokens = 256

            [pipeline]
            default_count = 5
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.news.api_key_env.as_deref(), Some("MY_NEWS_KEY"));
        assert_eq!(cfg.llm.adapter.as_deref(), Some("remote"));
        assert_eq!(cfg.pipeline.count(), 5);
        assert_eq!(cfg.pipeline.country(), "us");
        assert_eq!(cfg.pipeline.concurrency(), 1);
        assert!(cfg.server.port.is_none());
    }

    #[test]
    fn concurrency_never_below_one() {
        let cfg = PipelineConfig {
            summarize_concurrency: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.concurrency(), 1);
    }

    #[tokio::test]
    async fn override_file_wins_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");

        let mut f = std::fs::File::create(&default_path).unwrap();
        writeln!(f, "[pipeline]\ndefault_country = \"us\"\ndefault_count = 3\n\n[server]\nport = 8000").unwrap();
        let mut f = std::fs::File::create(&override_path).unwrap();
        writeln!(f, "[pipeline]\ndefault_country = \"gb\"").unwrap();

        let cfg = Config::load_with_defaults(Some(default_path.as_path()), Some(override_path.as_path()))
            .await
            .expect("load");
        assert_eq!(cfg.pipeline.country(), "gb");
        assert_eq!(cfg.pipeline.count(), 3);
        assert_eq!(cfg.server.port, Some(8000));
    }

    #[tokio::test]
    async fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let cfg = Config::load_with_defaults(Some(missing.as_path()), None)
            .await
            .expect("load");
        assert_eq!(cfg.pipeline.count(), 3);
        assert!(cfg.llm.adapter.is_none());
    }

    #[tokio::test]
    async fn from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[pipeline\n").unwrap();
        assert!(Config::from_file(&path).await.is_err());
    }

    #[test]
    fn gemini_is_the_default_adapter() {
        let settings = LlmSettings::resolve_with(
            &LlmConfig::default(),
            LlmTask::Summarization,
            env(&[("GEMINI_API_KEY", "g-key")]),
        )
        .expect("resolve");

        assert_eq!(settings.adapter, LlmAdapter::Gemini);
        assert_eq!(settings.api_url, DEFAULT_GEMINI_API_URL);
        assert_eq!(settings.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.api_key, "g-key");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!((settings.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_llm_key_is_fatal() {
        let err = LlmSettings::resolve_with(&LlmConfig::default(), LlmTask::Summarization, env(&[]))
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY is not set"));
    }

    #[test]
    fn empty_key_is_fatal() {
        let err = NewsSettings::resolve_with(&NewsConfig::default(), env(&[("NEWS_API_KEY", "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn chat_falls_back_to_summarization_endpoint() {
        let config = LlmConfig {
            adapter: Some("remote".into()),
            summarization: Some(LlmEndpointConfig {
                api_url: Some("http://localhost:11434/v1/chat/completions".into()),
                api_key_env: Some("LOCAL_KEY".into()),
                model: Some("llama3".into()),
                ..Default::default()
            }),
            chat: None,
        };

        let settings = LlmSettings::resolve_with(&config, LlmTask::Chat, env(&[("LOCAL_KEY", "k")]))
            .expect("resolve");
        assert_eq!(settings.adapter, LlmAdapter::Remote);
        assert_eq!(settings.model, "llama3");
        assert_eq!(settings.api_url, "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn unknown_adapter_is_rejected() {
        let config = LlmConfig {
            adapter: Some("carrier-pigeon".into()),
            ..Default::default()
        };
        assert!(LlmSettings::resolve_with(&config, LlmTask::Summarization, env(&[])).is_err());
    }

    #[test]
    fn invalid_news_url_is_rejected() {
        let config = NewsConfig {
            api_url: Some("not a url".into()),
            ..Default::default()
        };
        let err = NewsSettings::resolve_with(&config, env(&[("NEWS_API_KEY", "n")])).unwrap_err();
        assert!(err.to_string().contains("Invalid news api_url"));
    }

    #[test]
    fn settings_debug_hides_keys() {
        let settings = NewsSettings::resolve_with(&NewsConfig::default(), env(&[("NEWS_API_KEY", "secret-key")]))
            .expect("resolve");
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }
}
