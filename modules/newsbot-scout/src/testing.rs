// Test mocks for the news scanner.
//
// One mock per trait boundary:
// - MockFeedSource (FeedSource) — feed URL→entries
// - MockGovSource (GovSource) — fixed item list, filtered by is_seen
// - MockExtractor (ArticleExtractor) — URL→Extraction, records calls
// - FixedEmbedder / FailingEmbedder (TextEmbedder)
// - MockTranslator / MockSummarizer (TextTranslator / TextSummarizer)
// - RecordingMessenger (Messenger) — keeps every successful send
// - MockUpdates (UpdateSource) — canned bot updates

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use newsbot_common::{ArticleRecord, ChatId, FeedEntry, GovNewsItem, NewsbotError, TextEmbedder};

use crate::traits::{
    ArticleExtractor, Extraction, FeedSource, GovSource, IncomingMessage, Messenger, TextSummarizer,
    TextTranslator, UpdateSource,
};

/// Standard embedding dimension for test vectors.
pub const TEST_EMBEDDING_DIM: usize = 64;

/// A feed entry whose guid is its link.
pub fn entry(title: &str, link: &str) -> FeedEntry {
    FeedEntry {
        title: title.to_string(),
        link: link.to_string(),
        guid: link.to_string(),
    }
}

/// An article with a body long enough to reach the hash window.
pub fn article(title: &str, body: &str) -> ArticleRecord {
    ArticleRecord {
        title: title.to_string(),
        body: body.to_string(),
        images: Vec::new(),
        videos: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// MockFeedSource
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockFeedSource {
    feeds: HashMap<String, Vec<FeedEntry>>,
    failing: HashSet<String>,
}

impl MockFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_feed(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
        self.feeds.insert(url.to_string(), entries);
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    async fn entries(&self, feed_url: &str) -> Result<Vec<FeedEntry>, NewsbotError> {
        if self.failing.contains(feed_url) {
            return Err(NewsbotError::Fetch(format!("{feed_url}: connection refused")));
        }
        Ok(self.feeds.get(feed_url).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockGovSource
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockGovSource {
    items: Vec<GovNewsItem>,
}

impl MockGovSource {
    pub fn new(items: Vec<GovNewsItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl GovSource for MockGovSource {
    async fn items(&self, is_seen: &(dyn for<'s> Fn(&'s str) -> bool + Sync)) -> Vec<GovNewsItem> {
        self.items
            .iter()
            .filter(|item| !is_seen(&item.link))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// URL→Extraction map. Unknown URLs are `Unavailable`.
#[derive(Default)]
pub struct MockExtractor {
    outcomes: HashMap<String, Extraction>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_url(mut self, url: &str, record: ArticleRecord) -> Self {
        self.outcomes.insert(url.to_string(), Extraction::Article(record));
        self
    }

    pub fn on_url_outcome(mut self, url: &str, outcome: Extraction) -> Self {
        self.outcomes.insert(url.to_string(), outcome);
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleExtractor for MockExtractor {
    async fn extract(&self, url: &str) -> Result<Extraction, NewsbotError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(NewsbotError::Extraction(format!("{url}: timed out")));
        }
        Ok(self
            .outcomes
            .get(url)
            .cloned()
            .unwrap_or(Extraction::Unavailable))
    }
}

// ---------------------------------------------------------------------------
// FixedEmbedder
// ---------------------------------------------------------------------------

/// Deterministic embedder for testing. Registered texts get exact vectors;
/// unmatched texts get a unique hash-based vector (low similarity to everything).
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
        }
    }

    /// Register a text→vector mapping for controlled similarity.
    pub fn on_text(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    fn hash_vector(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vec = vec![0.0f32; self.dimension];
        for v in vec.iter_mut() {
            // Simple LCG PRNG
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *v = ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

#[async_trait]
impl TextEmbedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.hash_vector(text)))
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl TextEmbedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("embedding service unavailable")
    }
}

// ---------------------------------------------------------------------------
// MockTranslator / MockSummarizer
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum TranslateMode {
    Prefix,
    Fail,
}

/// Clones share call history and the rate-limit budget.
#[derive(Clone)]
pub struct MockTranslator {
    mode: TranslateMode,
    prefix: String,
    rate_limits_left: Arc<Mutex<usize>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    fn with_mode(mode: TranslateMode, prefix: &str) -> Self {
        Self {
            mode,
            prefix: prefix.to_string(),
            rate_limits_left: Arc::new(Mutex::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns `prefix + text`.
    pub fn prefixing(prefix: &str) -> Self {
        Self::with_mode(TranslateMode::Prefix, prefix)
    }

    pub fn identity() -> Self {
        Self::prefixing("")
    }

    pub fn failing() -> Self {
        Self::with_mode(TranslateMode::Fail, "")
    }

    /// The first `n` calls report a rate limit.
    pub fn rate_limited_times(self, n: usize) -> Self {
        *self.rate_limits_left.lock().unwrap() = n;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _from: Option<&str>,
        _to: &str,
    ) -> Result<String, NewsbotError> {
        self.calls.lock().unwrap().push(text.to_string());
        {
            let mut left = self.rate_limits_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(NewsbotError::RateLimited {
                    service: "mock-translator".to_string(),
                });
            }
        }
        match self.mode {
            TranslateMode::Prefix => Ok(format!("{}{}", self.prefix, text)),
            TranslateMode::Fail => Err(NewsbotError::Translation("HTTP 500".to_string())),
        }
    }
}

#[derive(Clone)]
pub struct MockSummarizer {
    keep_chars: Option<usize>,
    calls: Arc<Mutex<usize>>,
}

impl MockSummarizer {
    /// Summarizes by keeping the first `n` characters.
    pub fn first_chars(n: usize) -> Self {
        Self {
            keep_chars: Some(n),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            keep_chars: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TextSummarizer for MockSummarizer {
    async fn summarize(
        &self,
        text: &str,
        _language: &str,
        _max_sentences: usize,
    ) -> Result<String, NewsbotError> {
        *self.calls.lock().unwrap() += 1;
        match self.keep_chars {
            Some(n) => Ok(text.chars().take(n).collect()),
            None => Err(NewsbotError::Translation("summary job failed".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingMessenger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    /// Message text, or the caption for a photo.
    pub text: String,
    pub photo: Option<String>,
}

/// Records successful sends. Clones share the record.
#[derive(Clone, Default)]
pub struct RecordingMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing_chats: HashSet<ChatId>,
    failing_photos: bool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `chat_id` fails.
    pub fn failing_for(mut self, chat_id: ChatId) -> Self {
        self.failing_chats.insert(chat_id);
        self
    }

    /// Every photo send fails; text still goes through.
    pub fn failing_photos(mut self) -> Self {
        self.failing_photos = true;
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    fn record(&self, chat_id: ChatId, text: &str, photo: Option<&str>) -> Result<(), NewsbotError> {
        if self.failing_chats.contains(&chat_id) || (photo.is_some() && self.failing_photos) {
            return Err(NewsbotError::Delivery {
                chat_id,
                message: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            photo: photo.map(str::to_string),
        });
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: ChatId, html: &str) -> Result<(), NewsbotError> {
        self.record(chat_id, html, None)
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption_html: &str,
    ) -> Result<(), NewsbotError> {
        self.record(chat_id, caption_html, Some(photo_url))
    }
}

// ---------------------------------------------------------------------------
// MockUpdates
// ---------------------------------------------------------------------------

/// Returns queued messages at or after the requested offset and records
/// every offset it was polled with.
#[derive(Clone, Default)]
pub struct MockUpdates {
    messages: Vec<IncomingMessage>,
    offsets: Arc<Mutex<Vec<Option<i64>>>>,
}

impl MockUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, update_id: i64, chat_id: ChatId, text: &str) -> Self {
        self.messages.push(IncomingMessage {
            update_id,
            chat_id: Some(chat_id),
            text: Some(text.to_string()),
        });
        self
    }

    /// A sticker, photo or member event: no text, possibly no chat.
    pub fn with_non_text(mut self, update_id: i64, chat_id: Option<ChatId>) -> Self {
        self.messages.push(IncomingMessage {
            update_id,
            chat_id,
            text: None,
        });
        self
    }

    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateSource for MockUpdates {
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<IncomingMessage>, NewsbotError> {
        self.offsets.lock().unwrap().push(offset);
        Ok(self
            .messages
            .iter()
            .filter(|m| offset.map_or(true, |o| m.update_id >= o))
            .cloned()
            .collect())
    }
}
