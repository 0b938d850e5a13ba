use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use super::error::AzureError;
use super::types::{TranslateInput, TranslateResult};
use super::{SUBSCRIPTION_KEY_HEADER, SUBSCRIPTION_REGION_HEADER};

const TRANSLATOR_API_URL: &str = "https://api.cognitive.microsofttranslator.com";
const TRANSLATOR_API_VERSION: &str = "3.0";

/// Azure AI Translator (Text Translation v3).
#[derive(Clone)]
pub struct AzureTranslator {
    key: String,
    region: Option<String>,
    endpoint: String,
    http: reqwest::Client,
}

impl AzureTranslator {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: None,
            endpoint: TRANSLATOR_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    fn headers(&self) -> Result<HeaderMap, AzureError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            HeaderValue::from_str(&self.key).map_err(|_| AzureError::Api {
                status: 0,
                body: "translator key is not a valid header value".to_string(),
            })?,
        );
        if let Some(region) = self.region.as_deref().and_then(|r| HeaderValue::from_str(r).ok()) {
            headers.insert(SUBSCRIPTION_REGION_HEADER, region);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Translate `text` from `from` into `to`. `from = None` lets the service
    /// auto-detect the source language.
    pub async fn translate(
        &self,
        text: &str,
        from: Option<&str>,
        to: &str,
    ) -> Result<String, AzureError> {
        let url = format!("{}/translate", self.endpoint);

        let mut query = vec![("api-version", TRANSLATOR_API_VERSION), ("to", to)];
        if let Some(from) = from {
            query.push(("from", from));
        }

        debug!(to, chars = text.chars().count(), "Azure translate request");

        let response = self
            .http
            .post(&url)
            .query(&query)
            .headers(self.headers()?)
            .json(&[TranslateInput { text }])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AzureError::from_response(status.as_u16(), body));
        }

        let results: Vec<TranslateResult> = response.json().await?;

        results
            .into_iter()
            .next()
            .and_then(|r| r.translations.into_iter().next())
            .map(|t| t.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AzureError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let t = AzureTranslator::new("key").with_endpoint("https://example.cognitiveservices.azure.com/");
        assert_eq!(t.endpoint, "https://example.cognitiveservices.azure.com");
    }

    #[test]
    fn region_header_is_sent_when_configured() {
        let t = AzureTranslator::new("key").with_region("westeurope");
        let headers = t.headers().unwrap();
        assert_eq!(headers.get(SUBSCRIPTION_REGION_HEADER).unwrap(), "westeurope");
        assert_eq!(headers.get(SUBSCRIPTION_KEY_HEADER).unwrap(), "key");
    }

    #[test]
    fn translate_response_parses() {
        let json = r#"[{"detectedLanguage":{"language":"sr","score":1.0},"translations":[{"text":" Привет ","to":"ru"}]}]"#;
        let parsed: Vec<TranslateResult> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[0].translations[0].text, " Привет ");
    }
}
