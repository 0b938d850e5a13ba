use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::{debug, warn};

use super::error::AzureError;
use super::types::*;
use super::SUBSCRIPTION_KEY_HEADER;

const LANGUAGE_API_VERSION: &str = "2023-04-01";
const MAX_POLLS: u32 = 30;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Azure AI Language extractive summarization (analyze-text jobs API).
#[derive(Clone)]
pub struct AzureLanguage {
    key: String,
    endpoint: String,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl AzureLanguage {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Extract up to `max_sentences` sentences from `text`, joined by blank lines.
    pub async fn extractive_summary(
        &self,
        text: &str,
        language: &str,
        max_sentences: usize,
    ) -> Result<String, AzureError> {
        let url = format!(
            "{}/language/analyze-text/jobs?api-version={}",
            self.endpoint, LANGUAGE_API_VERSION
        );

        let request = AnalyzeJobRequest {
            display_name: "newsbot summary".to_string(),
            analysis_input: AnalysisInput {
                documents: vec![InputDocument {
                    id: "1".to_string(),
                    language: language.to_string(),
                    text: text.to_string(),
                }],
            },
            tasks: vec![AnalyzeTask {
                kind: "ExtractiveSummarization".to_string(),
                task_name: "summary".to_string(),
                parameters: SummaryParameters {
                    sentence_count: max_sentences,
                },
            }],
        };

        debug!(chars = text.chars().count(), max_sentences, "Azure summarization job");

        let response = self
            .http
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AzureError::from_response(status.as_u16(), body));
        }

        let operation = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AzureError::Job("missing operation-location header".to_string()))?;

        for _ in 0..MAX_POLLS {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .http
                .get(&operation)
                .header(SUBSCRIPTION_KEY_HEADER, &self.key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AzureError::from_response(status.as_u16(), body));
            }

            let state: AnalyzeJobState = response.json().await?;
            match state.status.as_str() {
                "succeeded" | "partiallyCompleted" => return summary_from_state(state),
                "failed" | "cancelled" | "cancelling" => {
                    let reason = state
                        .errors
                        .first()
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| state.status.clone());
                    return Err(AzureError::Job(reason));
                }
                _ => continue,
            }
        }

        warn!(operation, "Summarization job did not finish in time");
        Err(AzureError::Job("timed out waiting for job".to_string()))
    }
}

fn summary_from_state(state: AnalyzeJobState) -> Result<String, AzureError> {
    let results = state
        .tasks
        .and_then(|t| t.items.into_iter().next())
        .and_then(|item| item.results)
        .ok_or(AzureError::Empty)?;

    if let Some(err) = results.errors.first() {
        return Err(AzureError::Job(format!(
            "{}: {}",
            err.error.code, err.error.message
        )));
    }

    let summary = results
        .documents
        .into_iter()
        .next()
        .map(|doc| {
            doc.sentences
                .into_iter()
                .map(|s| s.text)
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .unwrap_or_default();

    let summary = summary.trim().to_string();
    if summary.is_empty() {
        Err(AzureError::Empty)
    } else {
        Ok(summary)
    }
}
