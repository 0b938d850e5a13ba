//! `/start` and `/stop` handling for the Telegram bot.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use newsbot_common::{ChatId, NewsbotError};

use crate::news_scanner::Shutdown;
use crate::store::SubscriberStore;
use crate::traits::{Messenger, UpdateSource};

pub const SUBSCRIBED: &str = "Вы подписаны на новости.";
pub const ALREADY_SUBSCRIBED: &str = "Вы уже подписаны на новости.";
pub const UNSUBSCRIBED: &str = "Вы отписаны от новостей и удалены из списка. Хорошего дня";
pub const NOT_SUBSCRIBED: &str = "Вы не были подписаны на новости.";

const ERROR_BACKOFF: Duration = Duration::from_secs(5);
const MAX_ERROR_BACKOFF: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    /// Parse `/start`, `/stop` and their `/start@botname` forms. Arguments
    /// after the command are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "stop" => Some(Command::Stop),
            _ => None,
        }
    }
}

/// Long-polls for bot commands and keeps the subscriber file up to date.
pub struct CommandListener {
    updates: Arc<dyn UpdateSource>,
    messenger: Arc<dyn Messenger>,
    subscribers: SubscriberStore,
    offset: Option<i64>,
}

impl CommandListener {
    pub fn new(
        updates: Arc<dyn UpdateSource>,
        messenger: Arc<dyn Messenger>,
        subscribers: SubscriberStore,
    ) -> Self {
        Self {
            updates,
            messenger,
            subscribers,
            offset: None,
        }
    }

    pub fn subscribers(&self) -> &SubscriberStore {
        &self.subscribers
    }

    /// Apply one message to the subscriber list and return the reply, if any.
    pub fn handle(&mut self, chat_id: ChatId, text: &str) -> Result<Option<&'static str>, NewsbotError> {
        let Some(command) = Command::parse(text) else {
            return Ok(None);
        };
        let reply = match command {
            Command::Start => {
                if self.subscribers.subscribe(chat_id)? {
                    info!(chat_id, "Subscriber added");
                    SUBSCRIBED
                } else {
                    ALREADY_SUBSCRIBED
                }
            }
            Command::Stop => {
                if self.subscribers.unsubscribe(chat_id)? {
                    info!(chat_id, "Subscriber removed");
                    UNSUBSCRIBED
                } else {
                    NOT_SUBSCRIBED
                }
            }
        };
        Ok(Some(reply))
    }

    /// Fetch one batch of updates and answer every command in it.
    /// Every update is acknowledged, text or not. Returns the number of
    /// updates seen.
    pub async fn poll_once(&mut self) -> Result<usize, NewsbotError> {
        let updates = self.updates.poll(self.offset).await?;
        for update in &updates {
            let next = update.update_id + 1;
            self.offset = Some(self.offset.map_or(next, |o| o.max(next)));
            let (Some(chat_id), Some(text)) = (update.chat_id, update.text.as_deref()) else {
                debug!(update_id = update.update_id, "Ignoring update without text");
                continue;
            };
            let reply = match self.handle(chat_id, text) {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    debug!(chat_id, "Ignoring non-command message");
                    continue;
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "Failed to update subscribers");
                    continue;
                }
            };
            if let Err(e) = self.messenger.send_text(chat_id, reply).await {
                warn!(chat_id, error = %e, "Failed to send command reply");
            }
        }
        Ok(updates.len())
    }

    /// Poll until shutdown. Errors back off exponentially up to two minutes.
    pub async fn run(mut self, mut shutdown: Shutdown) {
        info!("Command listener started");
        let mut backoff = ERROR_BACKOFF;
        while !shutdown.is_triggered() {
            let result = tokio::select! {
                r = self.poll_once() => r,
                _ = shutdown.wait() => break,
            };
            match result {
                Ok(_) => backoff = ERROR_BACKOFF,
                Err(e) => {
                    warn!(error = %e, backoff_secs = backoff.as_secs(), "Polling updates failed");
                    if shutdown.sleep(backoff).await {
                        break;
                    }
                    backoff = (backoff * 2).min(MAX_ERROR_BACKOFF);
                }
            }
        }
        info!("Command listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockUpdates, RecordingMessenger};

    fn listener(dir: &std::path::Path, updates: MockUpdates, messenger: RecordingMessenger) -> CommandListener {
        let store = SubscriberStore::load(dir.join("subscribers.txt")).unwrap();
        CommandListener::new(Arc::new(updates), Arc::new(messenger), store)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /stop  "), Some(Command::Stop));
        assert_eq!(Command::parse("/start@vijesti_bot"), Some(Command::Start));
        assert_eq!(Command::parse("/START payload"), Some(Command::Start));
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("/help"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn start_and_stop_toggle_subscription() {
        let dir = tempfile::tempdir().unwrap();
        let mut l = listener(dir.path(), MockUpdates::new(), RecordingMessenger::new());

        assert_eq!(l.handle(42, "/start").unwrap(), Some(SUBSCRIBED));
        assert_eq!(l.handle(42, "/start").unwrap(), Some(ALREADY_SUBSCRIBED));
        assert!(l.subscribers().contains(42));

        assert_eq!(l.handle(42, "/stop").unwrap(), Some(UNSUBSCRIBED));
        assert_eq!(l.handle(42, "/stop").unwrap(), Some(NOT_SUBSCRIBED));
        assert!(!l.subscribers().contains(42));

        assert_eq!(l.handle(42, "hello").unwrap(), None);
    }

    #[test]
    fn subscription_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut l = listener(dir.path(), MockUpdates::new(), RecordingMessenger::new());
        l.handle(7, "/start").unwrap();
        l.handle(9, "/start").unwrap();
        let ids = SubscriberStore::read_ids(&dir.path().join("subscribers.txt")).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![7, 9]);
    }

    #[tokio::test]
    async fn poll_once_replies_and_advances_offset() {
        let dir = tempfile::tempdir().unwrap();
        let updates = MockUpdates::new()
            .with_message(10, 1, "/start")
            .with_message(11, 2, "just chatting")
            .with_message(12, 1, "/stop");
        let messenger = RecordingMessenger::new();
        let mut l = listener(dir.path(), updates.clone(), messenger.clone());

        assert_eq!(l.poll_once().await.unwrap(), 3);
        let replies: Vec<_> = messenger.sent().into_iter().map(|m| (m.chat_id, m.text)).collect();
        assert_eq!(
            replies,
            vec![(1, SUBSCRIBED.to_string()), (1, UNSUBSCRIBED.to_string())]
        );

        assert_eq!(l.poll_once().await.unwrap(), 0);
        assert_eq!(updates.offsets(), vec![None, Some(13)]);
    }

    #[tokio::test]
    async fn updates_without_text_are_acknowledged() {
        let dir = tempfile::tempdir().unwrap();
        let updates = MockUpdates::new().with_non_text(5, Some(1)).with_non_text(6, None);
        let messenger = RecordingMessenger::new();
        let mut l = listener(dir.path(), updates.clone(), messenger.clone());

        assert_eq!(l.poll_once().await.unwrap(), 2);
        assert_eq!(l.poll_once().await.unwrap(), 0);

        assert_eq!(updates.offsets(), vec![None, Some(7)]);
        assert!(messenger.sent().is_empty());
    }
}
