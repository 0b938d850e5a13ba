// Page service: plain HTTP page fetching with a browser user agent.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ArchiveError, Result};

pub(crate) struct FetchedPage {
    pub url: String,
    pub html: String,
}

pub(crate) struct HttpPageService {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpPageService {
    pub(crate) fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArchiveError::Other(anyhow::anyhow!("Failed to build page HTTP client: {e}")))?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    /// Fetch a page, failing on transport errors and non-success statuses.
    pub(crate) async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = url::Url::parse(url).map_err(|_| ArchiveError::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ArchiveError::InvalidUrl(url.to_string()));
        }

        debug!(url, "page: fetching");

        let resp = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| ArchiveError::fetch(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = resp.url().to_string();
        let html = resp.text().await.map_err(|e| ArchiveError::fetch(url, e))?;

        info!(url, bytes = html.len(), "page: fetched successfully");

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

/// Title of an HTML document: `og:title` first, then `<title>`, then the first `<h1>`.
pub(crate) fn extract_title(doc: &scraper::Html) -> Option<String> {
    let og = scraper::Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    let title = scraper::Selector::parse("title").ok()?;
    let h1 = scraper::Selector::parse("h1").ok()?;

    doc.select(&og)
        .filter_map(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .or_else(|| text_of_first(doc, &title))
        .or_else(|| text_of_first(doc, &h1))
}

fn text_of_first(doc: &scraper::Html, selector: &scraper::Selector) -> Option<String> {
    doc.select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|s| !s.is_empty())
}
