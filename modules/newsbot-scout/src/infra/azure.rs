use async_trait::async_trait;

use ai_client::{AzureError, AzureLanguage, AzureTranslator};
use newsbot_common::NewsbotError;

use crate::traits::{TextSummarizer, TextTranslator};

pub struct AzureTextTranslator {
    client: AzureTranslator,
}

impl AzureTextTranslator {
    pub fn new(client: AzureTranslator) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextTranslator for AzureTextTranslator {
    async fn translate(
        &self,
        text: &str,
        from: Option<&str>,
        to: &str,
    ) -> Result<String, NewsbotError> {
        self.client
            .translate(text, from, to)
            .await
            .map_err(|e| map_error("azure-translator", e, NewsbotError::Translation))
    }
}

pub struct AzureSummarizer {
    client: AzureLanguage,
}

impl AzureSummarizer {
    pub fn new(client: AzureLanguage) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextSummarizer for AzureSummarizer {
    async fn summarize(
        &self,
        text: &str,
        language: &str,
        max_sentences: usize,
    ) -> Result<String, NewsbotError> {
        self.client
            .extractive_summary(text, language, max_sentences)
            .await
            .map_err(|e| map_error("azure-language", e, NewsbotError::Translation))
    }
}

fn map_error(service: &str, err: AzureError, other: fn(String) -> NewsbotError) -> NewsbotError {
    if err.is_rate_limited() {
        NewsbotError::RateLimited {
            service: service.to_string(),
        }
    } else {
        other(err.to_string())
    }
}
