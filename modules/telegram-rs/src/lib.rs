// Minimal Telegram Bot API client: the handful of methods a broadcast bot needs.
// https://core.telegram.org/bots/api

use std::time::Duration;

pub mod models;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::models::{
    ApiResponse, GetUpdatesRequest, Message, ParseMode, SendMessageRequest, SendPhotoRequest,
    Update,
};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Hard limit on `sendMessage` text length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;
/// Hard limit on `sendPhoto` caption length, in characters.
pub const MAX_CAPTION_CHARS: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Telegram flood control, retry after {seconds}s")]
    RetryAfter { seconds: u64 },

    #[error("Failed to parse Telegram response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TelegramError {
    /// The chat blocked the bot or no longer exists; retrying is pointless.
    pub fn is_unreachable_chat(&self) -> bool {
        matches!(self, TelegramError::Api { code: 403, .. })
            || matches!(self, TelegramError::Api { code: 400, description } if description.contains("chat not found"))
    }
}

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub token: String,
    pub api_url: String,
}

impl TelegramOptions {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: TELEGRAM_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.options.api_url.trim_end_matches('/'),
            self.options.token,
            method
        )
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        debug!(method, "Telegram API call");

        // Telegram returns a JSON envelope for error statuses too, so the body
        // is decoded regardless of the HTTP status.
        let bytes = request.send().await?.bytes().await?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        envelope.into_result()
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<Message, TelegramError> {
        let body = SendMessageRequest {
            chat_id,
            text,
            parse_mode: Some(parse_mode),
            disable_web_page_preview: Some(true),
        };
        self.call("sendMessage", &body, None).await
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
        parse_mode: ParseMode,
    ) -> Result<Message, TelegramError> {
        let body = SendPhotoRequest {
            chat_id,
            photo: photo_url,
            caption: (!caption.is_empty()).then_some(caption),
            parse_mode: Some(parse_mode),
        };
        self.call("sendPhoto", &body, None).await
    }

    /// Long-poll for new updates. `timeout_secs` is the server-side wait.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        // Leave headroom over the server-side wait so the request is not cut short.
        let client_timeout = Duration::from_secs(timeout_secs + 10);
        self.call("getUpdates", &body, Some(client_timeout)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let service = TelegramService::new(TelegramOptions::new("123:abc"));
        assert_eq!(
            service.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_method_url_custom_api() {
        let mut options = TelegramOptions::new("t");
        options.api_url = "http://localhost:8081/".to_string();
        let service = TelegramService::new(options);
        assert_eq!(service.method_url("getUpdates"), "http://localhost:8081/bott/getUpdates");
    }

    #[test]
    fn test_unreachable_chat() {
        let blocked = TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".to_string(),
        };
        assert!(blocked.is_unreachable_chat());

        let missing = TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string(),
        };
        assert!(missing.is_unreachable_chat());

        let bad_html = TelegramError::Api {
            code: 400,
            description: "Bad Request: can't parse entities".to_string(),
        };
        assert!(!bad_html.is_unreachable_chat());
    }
}
