// Trait abstractions for the scanner's collaborators.
//
// ArticleExtractor, FeedSource and GovSource wrap the archive; TextTranslator
// and TextSummarizer wrap Azure; Messenger and UpdateSource wrap Telegram.
// Tests substitute the mocks in `testing`: no network, no API keys.

use async_trait::async_trait;

use newsbot_archive::{Archive, GovScraper};
use newsbot_common::{ArticleRecord, ChatId, FeedEntry, GovNewsItem, NewsbotError};

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Which content-level check an extractor already matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    Hash,
    Semantic,
}

/// Outcome of extracting one article URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Article(ArticleRecord),
    /// The extractor recognised the article as already delivered.
    Duplicate(DuplicateKind),
    /// The page was fetched but had no usable body.
    Unavailable,
}

#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Extraction, NewsbotError>;
}

#[async_trait]
impl ArticleExtractor for Archive {
    async fn extract(&self, url: &str) -> Result<Extraction, NewsbotError> {
        match self.article(url).await {
            Ok(Some(record)) if !record.is_empty() => Ok(Extraction::Article(record)),
            Ok(_) => Ok(Extraction::Unavailable),
            Err(e) => Err(NewsbotError::Extraction(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Keyword-filtered entries of one feed, in feed order.
    async fn entries(&self, feed_url: &str) -> Result<Vec<FeedEntry>, NewsbotError>;
}

#[async_trait]
impl FeedSource for Archive {
    async fn entries(&self, feed_url: &str) -> Result<Vec<FeedEntry>, NewsbotError> {
        Ok(self.feed(feed_url).await?)
    }
}

#[async_trait]
pub trait GovSource: Send + Sync {
    /// Items from the government listing whose link is not `is_seen`.
    async fn items(&self, is_seen: &(dyn for<'s> Fn(&'s str) -> bool + Sync)) -> Vec<GovNewsItem>;
}

#[async_trait]
impl GovSource for GovScraper {
    async fn items(&self, is_seen: &(dyn for<'s> Fn(&'s str) -> bool + Sync)) -> Vec<GovNewsItem> {
        self.fetch_all(is_seen).await
    }
}

// ---------------------------------------------------------------------------
// Language services
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TextTranslator: Send + Sync {
    /// Translate `text` into `to`. Rate limiting surfaces as
    /// `NewsbotError::RateLimited` so the caller can cool down and retry.
    async fn translate(&self, text: &str, from: Option<&str>, to: &str)
        -> Result<String, NewsbotError>;
}

#[async_trait]
pub trait TextSummarizer: Send + Sync {
    async fn summarize(
        &self,
        text: &str,
        language: &str,
        max_sentences: usize,
    ) -> Result<String, NewsbotError>;
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send an HTML-formatted text message.
    async fn send_text(&self, chat_id: ChatId, html: &str) -> Result<(), NewsbotError>;

    /// Send a photo by URL with an HTML-formatted caption.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption_html: &str,
    ) -> Result<(), NewsbotError>;
}

/// One bot update. `chat_id` and `text` are absent for updates that carry
/// no text message (stickers, photos, member events); those still have to
/// be acknowledged through the offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub update_id: i64,
    pub chat_id: Option<ChatId>,
    pub text: Option<String>,
}

#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Long-poll for every update with `update_id >= offset`.
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<IncomingMessage>, NewsbotError>;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockGovSource;

    fn gov_item(link: &str) -> GovNewsItem {
        GovNewsItem {
            title: "Sjednica Vlade".to_string(),
            link: link.to_string(),
            summary: String::new(),
            date: String::new(),
            full_text: "Vlada je usvojila zaključke.".to_string(),
            images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn gov_source_accepts_a_borrowing_seen_check() {
        let source: Arc<dyn GovSource> = Arc::new(MockGovSource::new(vec![
            gov_item("https://www.gov.me/clanak/a"),
            gov_item("https://www.gov.me/clanak/b"),
        ]));
        let seen: HashSet<String> = HashSet::from(["https://www.gov.me/clanak/a".to_string()]);

        let items = source.items(&|link: &str| seen.contains(link)).await;

        let links: Vec<_> = items.into_iter().map(|i| i.link).collect();
        assert_eq!(links, vec!["https://www.gov.me/clanak/b".to_string()]);
    }
}
