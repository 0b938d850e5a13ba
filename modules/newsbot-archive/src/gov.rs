// Government news listing scraper (gov.me/vijesti).
// Listing pages carry title, summary and date; each new item's page is then
// fetched for the full text and images.

use std::ops::RangeInclusive;
use std::sync::LazyLock;
use std::time::Duration;

use rand::Rng;
use scraper::{Html, Selector};
use tracing::{debug, error, info, warn};
use url::Url;

use newsbot_common::config::GovConfig;
use newsbot_common::{clean_url, ArticleImage, GovNewsItem};

use crate::error::{ArchiveError, Result};
use crate::services::page::HttpPageService;
use crate::sites::{collapse_whitespace, extract_paragraphs, ImageRule};

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static SEARCH_ITEM: LazyLock<Selector> = LazyLock::new(|| sel("app-search-item"));
static ITEM_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a.cursor-pointer"));
static ITEM_SUMMARY: LazyLock<Selector> = LazyLock::new(|| sel("p"));
static ITEM_TIME: LazyLock<Selector> = LazyLock::new(|| sel("time"));
static ARTICLE_SECTION: LazyLock<Selector> =
    LazyLock::new(|| sel("app-article-body section.relative.ui-article-spacing"));

/// One row of a listing page, before the article itself is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovListing {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub date: String,
}

/// Result of scraping one listing page.
#[derive(Debug, Default)]
pub struct GovPage {
    /// Rows on the listing page, including already-seen ones.
    pub listed: usize,
    pub items: Vec<GovNewsItem>,
}

pub struct GovScraper {
    pages: HttpPageService,
    base_url: Url,
    max_pages: u32,
    jitter: Option<RangeInclusive<u64>>,
}

impl GovScraper {
    pub fn new(config: &GovConfig, user_agent: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| ArchiveError::InvalidUrl(config.base_url.clone()))?;
        Ok(Self {
            pages: HttpPageService::new(user_agent, timeout)?,
            base_url,
            max_pages: config.max_pages,
            jitter: Some(1..=3),
        })
    }

    /// Random pause (in seconds) after each listing request. `None` disables it.
    pub fn with_jitter(mut self, jitter: Option<RangeInclusive<u64>>) -> Self {
        self.jitter = jitter;
        self
    }

    fn page_url(&self, page: u32) -> String {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string());
        url.to_string()
    }

    /// Scrape listing page `page` (1-based). Rows for which `is_seen(link)`
    /// holds are counted but not fetched.
    pub async fn fetch_page(
        &self,
        page: u32,
        is_seen: &(dyn for<'s> Fn(&'s str) -> bool + Sync),
    ) -> Result<GovPage> {
        let url = self.page_url(page);
        let fetched = self.pages.fetch(&url).await;
        self.pause().await;
        let listing_html = fetched?.html;

        let listings = parse_listing(&listing_html, &self.base_url);
        let listed = listings.len();
        let mut items = Vec::new();

        for listing in listings {
            if is_seen(&listing.link) {
                debug!(link = %listing.link, "gov: already sent, skipping");
                continue;
            }
            match self.pages.fetch(&listing.link).await {
                Ok(article) => {
                    let (full_text, images) = parse_article(&article.html, &listing.link);
                    items.push(GovNewsItem {
                        title: listing.title,
                        link: listing.link,
                        summary: listing.summary,
                        date: listing.date,
                        full_text,
                        images,
                    });
                }
                Err(e) => warn!(link = %listing.link, error = %e, "gov: article fetch failed"),
            }
        }

        info!(page, listed, new = items.len(), "gov: listing page scraped");
        Ok(GovPage { listed, items })
    }

    /// Walk listing pages until `max_pages` or the first empty page.
    /// Failing pages are logged and skipped.
    pub async fn fetch_all(&self, is_seen: &(dyn for<'s> Fn(&'s str) -> bool + Sync)) -> Vec<GovNewsItem> {
        let mut news = Vec::new();
        for page in 1..=self.max_pages {
            match self.fetch_page(page, is_seen).await {
                Ok(result) => {
                    let empty = result.listed == 0;
                    news.extend(result.items);
                    if empty {
                        info!(page, "gov: no more news items, ending pagination");
                        break;
                    }
                }
                Err(e) => error!(page, error = %e, "gov: failed to fetch listing page"),
            }
        }
        info!(items = news.len(), "gov: fetched news items");
        news
    }

    async fn pause(&self) {
        if let Some(range) = &self.jitter {
            let secs = rand::rng().random_range(range.clone());
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}

/// Rows of a listing page. Links are resolved against `base` and stripped of
/// their query string.
pub fn parse_listing(html: &str, base: &Url) -> Vec<GovListing> {
    let doc = Html::parse_document(html);
    doc.select(&SEARCH_ITEM)
        .filter_map(|item| {
            let Some(anchor) = item.select(&ITEM_LINK).next() else {
                debug!("gov: search item without link");
                return None;
            };
            let href = anchor.value().attr("href")?;
            let link = clean_url(base.join(href).ok()?.as_str());
            let text_of = |s: &Selector| {
                item.select(s)
                    .next()
                    .map(|e| collapse_whitespace(&e.text().collect::<String>()))
                    .unwrap_or_default()
            };
            Some(GovListing {
                title: collapse_whitespace(&anchor.text().collect::<String>()),
                link,
                summary: text_of(&ITEM_SUMMARY),
                date: text_of(&ITEM_TIME),
            })
        })
        .collect()
}

/// Full text (paragraphs separated by a blank line) and images of an article page.
pub fn parse_article(html: &str, url: &str) -> (String, Vec<ArticleImage>) {
    let doc = Html::parse_document(html);
    let text = extract_paragraphs(&doc, &ARTICLE_SECTION).unwrap_or_default();
    let images = match Url::parse(url) {
        Ok(base) => ImageRule::Generic.extract(&doc, &base),
        Err(_) => Vec::new(),
    };
    (text, images)
}
