// Translation and summarization policy around the language services.

use std::sync::Arc;

use tracing::{debug, info, warn};

use newsbot_common::config::TranslationConfig;
use newsbot_common::NewsbotError;

use crate::traits::{TextSummarizer, TextTranslator};

/// Title and body in the target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub title: String,
    pub body: String,
}

/// Translates title and body together, appends a per-source footer, and
/// summarizes long bodies.
pub struct TranslationPipeline {
    translator: Arc<dyn TextTranslator>,
    summarizer: Arc<dyn TextSummarizer>,
    config: TranslationConfig,
}

impl TranslationPipeline {
    pub fn new(
        translator: Arc<dyn TextTranslator>,
        summarizer: Arc<dyn TextSummarizer>,
        config: TranslationConfig,
    ) -> Self {
        Self {
            translator,
            summarizer,
            config,
        }
    }

    pub async fn process(
        &self,
        title: &str,
        body: &str,
        footer: Option<&str>,
    ) -> Result<Translation, NewsbotError> {
        let mut translation = self.translate_article(title, body).await?;
        translation.body = self.summarize_if_long(translation.body).await;
        if let Some(footer) = footer.filter(|f| !f.is_empty()) {
            translation.body = format!("{}\n\n{footer}", translation.body);
        }
        Ok(translation)
    }

    /// Translate `title\n\nbody` in one request and split it back on the
    /// first blank line.
    ///
    /// A rate-limit response gets one retry after the cool-down; a second one
    /// fails the item. Any other error falls back to the original text.
    pub async fn translate_article(&self, title: &str, body: &str) -> Result<Translation, NewsbotError> {
        let joined = format!("{title}\n\n{body}");

        let mut attempt = 0;
        let translated = loop {
            attempt += 1;
            tokio::time::sleep(self.config.pause()).await;
            match self
                .translator
                .translate(
                    &joined,
                    self.config.source_language.as_deref(),
                    &self.config.target_language,
                )
                .await
            {
                Ok(text) => break text,
                Err(NewsbotError::RateLimited { service }) if attempt < 2 => {
                    warn!(
                        service = %service,
                        cooldown_secs = self.config.rate_limit_cooldown_secs,
                        "Translation rate limited, cooling down before retry"
                    );
                    tokio::time::sleep(self.config.rate_limit_cooldown()).await;
                }
                Err(e @ NewsbotError::RateLimited { .. }) => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Translation failed, keeping original text");
                    return Ok(Translation {
                        title: title.to_string(),
                        body: body.to_string(),
                    });
                }
            }
        };

        info!(chars = translated.chars().count(), "Translated article");
        Ok(split_translation(&translated, title))
    }

    /// Summarize when the body exceeds the threshold. Failures keep the full body.
    pub async fn summarize_if_long(&self, body: String) -> String {
        let chars = body.chars().count();
        if chars <= self.config.summarize_threshold {
            return body;
        }
        match self
            .summarizer
            .summarize(&body, &self.config.target_language, self.config.summary_sentences)
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => {
                debug!(from = chars, to = summary.chars().count(), "Summarized body");
                summary
            }
            Ok(_) => {
                warn!("Summarizer returned nothing, keeping full body");
                body
            }
            Err(e) => {
                warn!(error = %e, "Summarization failed, keeping full body");
                body
            }
        }
    }
}

/// Split `title\n\nbody`. Without a blank line the whole text is the body and
/// `original_title` is kept.
pub fn split_translation(translated: &str, original_title: &str) -> Translation {
    match translated.split_once("\n\n") {
        Some((title, body)) if !title.trim().is_empty() => Translation {
            title: title.trim().to_string(),
            body: body.trim().to_string(),
        },
        _ => Translation {
            title: original_title.to_string(),
            body: translated.trim().to_string(),
        },
    }
}
