use serde::{Deserialize, Serialize};

/// Telegram chat identifier of a subscriber.
pub type ChatId = i64;

/// One entry of an RSS/Atom feed, after keyword filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Feed GUID; falls back to the link when the feed has none.
    pub guid: String,
}

/// An article image with an optional caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleImage {
    pub url: String,
    #[serde(default)]
    pub caption: String,
}

impl ArticleImage {
    pub fn new(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: caption.into(),
        }
    }
}

/// Normalized article produced by extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub body: String,
    pub images: Vec<ArticleImage>,
    pub videos: Vec<String>,
}

impl ArticleRecord {
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// One item listed on the government news site. Already carries its full text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovNewsItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub date: String,
    pub full_text: String,
    pub images: Vec<ArticleImage>,
}

/// A unit of work for the scanner: something that may become a delivered article.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleCandidate {
    /// Dedup key: feed GUID, or the canonical link.
    pub identifier: String,
    pub link: String,
    pub title: String,
    /// Key of the source that produced the candidate (feed URL or `gov`).
    pub source: String,
    /// Present when the source already scraped the article body.
    pub article: Option<ArticleRecord>,
}

impl ArticleCandidate {
    pub fn from_feed_entry(entry: FeedEntry, source: &str) -> Self {
        Self {
            identifier: entry.guid,
            link: entry.link,
            title: entry.title,
            source: source.to_string(),
            article: None,
        }
    }

    pub fn from_gov_item(item: GovNewsItem, source: &str) -> Self {
        let article = ArticleRecord {
            title: item.title.clone(),
            body: item.full_text,
            images: item.images,
            videos: Vec::new(),
        };
        Self {
            identifier: item.link.clone(),
            link: item.link,
            title: item.title,
            source: source.to_string(),
            article: Some(article),
        }
    }
}
