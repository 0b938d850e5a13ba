use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use newsbot_common::{ChatId, NewsbotError};
use telegram::models::ParseMode;
use telegram::{TelegramError, TelegramService};

use crate::traits::{IncomingMessage, Messenger, UpdateSource};

/// Server-side wait for `getUpdates`.
const LONG_POLL_SECS: u64 = 30;

pub struct TelegramMessenger {
    service: TelegramService,
}

impl TelegramMessenger {
    pub fn new(service: TelegramService) -> Self {
        Self { service }
    }

    /// Run `send`, waiting out one flood-control response before retrying.
    async fn with_flood_retry<F, Fut>(&self, chat_id: ChatId, send: F) -> Result<(), NewsbotError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<telegram::models::Message, TelegramError>>,
    {
        let result = match send().await {
            Err(TelegramError::RetryAfter { seconds }) => {
                warn!(chat_id, seconds, "Telegram flood control, waiting");
                tokio::time::sleep(Duration::from_secs(seconds)).await;
                send().await
            }
            other => other,
        };
        result.map(|_| ()).map_err(|e| {
            if e.is_unreachable_chat() {
                warn!(chat_id, "Chat unreachable, bot blocked or chat deleted");
            }
            NewsbotError::Delivery {
                chat_id,
                message: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, html: &str) -> Result<(), NewsbotError> {
        self.with_flood_retry(chat_id, || {
            self.service.send_message(chat_id, html, ParseMode::Html)
        })
        .await
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption_html: &str,
    ) -> Result<(), NewsbotError> {
        self.with_flood_retry(chat_id, || {
            self.service
                .send_photo(chat_id, photo_url, caption_html, ParseMode::Html)
        })
        .await
    }
}

#[async_trait]
impl UpdateSource for TelegramMessenger {
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<IncomingMessage>, NewsbotError> {
        let updates = self
            .service
            .get_updates(offset, LONG_POLL_SECS)
            .await
            .map_err(|e| NewsbotError::Fetch(format!("getUpdates: {e}")))?;
        Ok(updates
            .into_iter()
            .map(|update| {
                let (chat_id, text) = match update.message {
                    Some(message) => (Some(message.chat.id), message.text),
                    None => (None, None),
                };
                IncomingMessage {
                    update_id: update.update_id,
                    chat_id,
                    text,
                }
            })
            .collect())
    }
}
