use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::NewsbotError;

/// Secrets and service endpoints loaded from environment variables.
/// Behaviour (feeds, thresholds, pacing) lives in the TOML [`FileConfig`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Telegram
    pub telegram_token: String,

    // Azure Translator
    pub azure_translation_key: String,
    pub azure_translation_endpoint: Option<String>,
    pub azure_translation_region: Option<String>,

    // Azure Language (summarization)
    pub azure_analytics_key: String,
    pub azure_analytics_endpoint: String,

    // Embeddings (OpenAI-compatible)
    pub embedding_api_key: String,
    pub embedding_base_url: Option<String>,
    pub embedding_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present).
    /// Missing credentials are a fatal configuration error.
    pub fn from_env() -> Result<Self, NewsbotError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            telegram_token: required_env("TELEGRAM_TOKEN")?,
            azure_translation_key: required_env("AZURE_TRANSLATION_KEY")?,
            azure_translation_endpoint: optional_env("AZURE_TRANSLATION_ENDPOINT"),
            azure_translation_region: optional_env("AZURE_TRANSLATION_REGION"),
            azure_analytics_key: required_env("AZURE_ANALYTICS_KEY")?,
            azure_analytics_endpoint: required_env("AZURE_ANALYTICS_ENDPOINT")?,
            embedding_api_key: optional_env("EMBEDDING_API_KEY").unwrap_or_default(),
            embedding_base_url: optional_env("EMBEDDING_BASE_URL"),
            embedding_model: optional_env("EMBEDDING_MODEL"),
        })
    }

    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().take(5).collect::<String>();
            format!("{}...({} chars)", n, val.chars().count())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => v.clone(),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  TELEGRAM_TOKEN: {}", preview(&self.telegram_token));
        tracing::info!("  AZURE_TRANSLATION_KEY: {}", preview(&self.azure_translation_key));
        tracing::info!(
            "  AZURE_TRANSLATION_ENDPOINT: {}",
            preview_opt(&self.azure_translation_endpoint)
        );
        tracing::info!("  AZURE_ANALYTICS_KEY: {}", preview(&self.azure_analytics_key));
        tracing::info!("  AZURE_ANALYTICS_ENDPOINT: {}", self.azure_analytics_endpoint);
        tracing::info!("  EMBEDDING_BASE_URL: {}", preview_opt(&self.embedding_base_url));
        tracing::info!("  EMBEDDING_MODEL: {}", preview_opt(&self.embedding_model));
    }
}

fn required_env(key: &str) -> Result<String, NewsbotError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(NewsbotError::Config(format!(
            "{key} environment variable is required"
        ))),
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// TOML file config
// ---------------------------------------------------------------------------

/// TOML-backed behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gov: GovConfig,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    #[serde(default)]
    pub tags: Vec<TagRuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScanConfig {
    pub poll_interval_secs: u64,
    /// Links containing any of these (case-insensitive) are never processed.
    pub filter_keywords: Vec<String>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3600,
            filter_keywords: Vec::new(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3"
                .to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ScanConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DedupConfig {
    pub similarity_threshold: f64,
    /// Character offset of the hashed body window.
    pub hash_window_offset: usize,
    /// Character length of the hashed body window.
    pub hash_window_length: usize,
    /// Oldest vectors are evicted past this many. `None` keeps everything.
    pub max_embeddings: Option<usize>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            hash_window_offset: 50,
            hash_window_length: 200,
            max_embeddings: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DeliveryConfig {
    pub max_message_length: usize,
    pub max_caption_length: usize,
    pub message_pause_ms: u64,
    pub photo_pause_ms: u64,
    pub continuation_marker: String,
    pub caption_continuation_marker: String,
    pub read_more_label: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_message_length: 4000,
            max_caption_length: 1024,
            message_pause_ms: 2000,
            photo_pause_ms: 1500,
            continuation_marker: "\n\n<b>Продолжение следует...</b>".to_string(),
            caption_continuation_marker: "\n\n<b>Продолжение внизу</b>".to_string(),
            read_more_label: "Читать на сайте".to_string(),
        }
    }
}

impl DeliveryConfig {
    pub fn message_pause(&self) -> Duration {
        Duration::from_millis(self.message_pause_ms)
    }

    pub fn photo_pause(&self) -> Duration {
        Duration::from_millis(self.photo_pause_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TranslationConfig {
    /// `None` lets the translator detect the source language.
    pub source_language: Option<String>,
    pub target_language: String,
    pub pause_ms: u64,
    pub rate_limit_cooldown_secs: u64,
    /// Translated bodies longer than this many characters are summarized.
    pub summarize_threshold: usize,
    pub summary_sentences: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_language: Some("sr-Latn".to_string()),
            target_language: "ru".to_string(),
            pause_ms: 1100,
            rate_limit_cooldown_secs: 60,
            summarize_threshold: 1000,
            summary_sentences: 20,
        }
    }
}

impl TranslationConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StorageConfig {
    pub sent_identifiers: PathBuf,
    pub content_hashes: PathBuf,
    pub subscribers: PathBuf,
    pub embeddings: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sent_identifiers: PathBuf::from("data/sent_news.txt"),
            content_hashes: PathBuf::from("data/news_history.txt"),
            subscribers: PathBuf::from("data/subscribers.txt"),
            embeddings: PathBuf::from("data/news_embeddings.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GovConfig {
    pub enabled: bool,
    pub base_url: String,
    pub max_pages: u32,
    pub tag: String,
}

impl Default for GovConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://www.gov.me/vijesti".to_string(),
            max_pages: 10,
            tag: "#GOV".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    pub url: String,
    /// Source label appended to every article from this feed.
    #[serde(default)]
    pub tag: Option<String>,
    /// Text appended to the translated body (e.g. a paywall notice).
    #[serde(default)]
    pub footer: Option<String>,
}

/// Content tag: `label` is applied when the body contains any of `keywords`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRuleConfig {
    pub keywords: Vec<String>,
    pub label: String,
}

impl FileConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FileConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), NewsbotError> {
        if self.feeds.is_empty() && !self.gov.enabled {
            return Err(NewsbotError::Config(
                "no sources configured: add [[feeds]] or enable [gov]".to_string(),
            ));
        }
        if !(self.dedup.similarity_threshold > 0.0 && self.dedup.similarity_threshold <= 1.0) {
            return Err(NewsbotError::Config(format!(
                "dedup.similarity_threshold must be in (0, 1], got {}",
                self.dedup.similarity_threshold
            )));
        }
        if self.delivery.max_message_length == 0 || self.delivery.max_caption_length == 0 {
            return Err(NewsbotError::Config(
                "delivery lengths must be positive".to_string(),
            ));
        }
        if let Some(feed) = self.feeds.iter().find(|f| url::Url::parse(&f.url).is_err()) {
            return Err(NewsbotError::Config(format!("invalid feed url: {}", feed.url)));
        }
        Ok(())
    }
}
