// Archive: the public entry point for fetching sources and articles.
// Callers use `archive.feed(url)` for RSS entries and `archive.article(url)`
// for a normalized ArticleRecord.

use std::time::Duration;

use newsbot_common::config::ScanConfig;
use newsbot_common::{ArticleRecord, FeedEntry};
use scraper::Html;
use tracing::{debug, info};

use crate::error::Result;
use crate::readability::{html_to_text, strip_bonus_video, word_count, MIN_READABLE_WORDS};
use crate::services::feed::FeedService;
use crate::services::page::{extract_title, HttpPageService};
use crate::sites::{extract_videos, SiteRegistry};

/// HTTP settings shared by the feed and page fetchers.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Feed entries whose link contains one of these are dropped.
    pub filter_keywords: Vec<String>,
}

impl From<&ScanConfig> for ArchiveConfig {
    fn from(scan: &ScanConfig) -> Self {
        Self {
            user_agent: scan.user_agent.clone(),
            timeout: scan.request_timeout(),
            filter_keywords: scan.filter_keywords.clone(),
        }
    }
}

/// The archive: fetch feeds and article pages and normalize them.
pub struct Archive {
    pages: HttpPageService,
    feeds: FeedService,
    sites: SiteRegistry,
}

impl Archive {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        Ok(Self {
            pages: HttpPageService::new(&config.user_agent, config.timeout)?,
            feeds: FeedService::new(&config.user_agent, config.timeout, config.filter_keywords)?,
            sites: SiteRegistry::with_defaults()?,
        })
    }

    pub fn with_sites(mut self, sites: SiteRegistry) -> Self {
        self.sites = sites;
        self
    }

    /// Entries of an RSS/Atom feed, keyword-filtered, in feed order.
    pub async fn feed(&self, url: &str) -> Result<Vec<FeedEntry>> {
        self.feeds.fetch(url).await
    }

    /// Fetch and extract an article. `Ok(None)` means the page was reachable
    /// but no body text could be extracted.
    pub async fn article(&self, url: &str) -> Result<Option<ArticleRecord>> {
        let page = self.pages.fetch(url).await?;
        let record = extract_article(&page.html, &page.url, &self.sites);
        match &record {
            Some(r) => info!(
                url,
                words = word_count(&r.body),
                images = r.images.len(),
                videos = r.videos.len(),
                "archive: article extracted"
            ),
            None => info!(url, "archive: no article body"),
        }
        Ok(record)
    }
}

/// Normalize an article page. Readability output is used unless it has
/// fewer than 20 words, in which case the site's container selector wins.
/// The "Bonus video:" teaser is cut from readability output only; selector
/// bodies are kept whole.
pub fn extract_article(html: &str, url: &str, sites: &SiteRegistry) -> Option<ArticleRecord> {
    let readable = html_to_text(html.as_bytes(), Some(url));
    let doc = Html::parse_document(html);

    let body = if word_count(&readable) >= MIN_READABLE_WORDS {
        strip_bonus_video(&readable)
    } else {
        debug!(url, words = word_count(&readable), "archive: readability too short, trying site selector");
        match sites.for_url(url).and_then(|site| site.extract_body(&doc)) {
            Some(selected) => selected,
            None => strip_bonus_video(&readable),
        }
    };
    if body.trim().is_empty() {
        return None;
    }

    let videos = url::Url::parse(url)
        .map(|base| extract_videos(&doc, &base))
        .unwrap_or_default();

    Some(ArticleRecord {
        title: extract_title(&doc).unwrap_or_default(),
        body,
        images: sites.extract_images(&doc, url),
        videos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_site_selector_for_short_readability() {
        let html = r#"<html><head><meta property="og:title" content="Nestanak struje u Baru"></head>
            <body><div class="entry-content herald-entry-content">
            <p>Struje neće biti u dijelu Bara.</p>
            <p>Bonus video: pogledajte</p>
            </div></body></html>"#;
        let sites = SiteRegistry::with_defaults().unwrap();
        let record = extract_article(html, "https://www.cdm.me/drustvo/struja/", &sites).unwrap();
        assert_eq!(record.title, "Nestanak struje u Baru");
        assert!(record.body.contains("Struje neće biti u dijelu Bara."));
        assert!(record.body.contains("Bonus video: pogledajte"));
    }

    #[test]
    fn readable_body_is_cut_at_bonus_video() {
        let html = r#"<html><head><title>Sjednica Vlade</title></head><body><article>
            <h1>Sjednica Vlade</h1>
            <p>Vlada Crne Gore je na današnjoj sjednici usvojila informaciju o pripremama
            za turističku sezonu i zadužila nadležna ministarstva da do kraja mjeseca dostave
            detaljne planove rada, uključujući mjere za saobraćaj, snabdijevanje vodom i
            bezbjednost na plažama duž cijelog primorja.</p>
            <p>Bonus video: pogledajte snimak sa sjednice</p>
            </article></body></html>"#;
        let sites = SiteRegistry::with_defaults().unwrap();
        let record = extract_article(html, "https://www.vijesti.me/vijesti/politika/1/sjednica", &sites).unwrap();
        assert!(record.body.contains("turističku sezonu"));
        assert!(!record.body.contains("Bonus video"));
    }

    #[test]
    fn empty_page_has_no_article() {
        let sites = SiteRegistry::with_defaults().unwrap();
        assert!(extract_article("<html><body></body></html>", "https://bankar.me/a", &sites).is_none());
    }

    #[test]
    fn config_from_scan_section() {
        let scan = ScanConfig::default();
        let config = ArchiveConfig::from(&scan);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }
}
