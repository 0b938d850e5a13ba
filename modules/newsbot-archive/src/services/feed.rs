// RSS/Atom feed service.
// Returns the feed's entries as FeedEntry values, guid defaulting to link.

use std::time::Duration;

use newsbot_common::FeedEntry;
use tracing::{debug, info};

use crate::error::{ArchiveError, Result};

pub(crate) struct FeedService {
    client: reqwest::Client,
    user_agent: String,
    filter_keywords: Vec<String>,
}

impl FeedService {
    pub(crate) fn new(
        user_agent: &str,
        timeout: Duration,
        filter_keywords: Vec<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArchiveError::Other(anyhow::anyhow!("Failed to build RSS HTTP client: {e}")))?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            filter_keywords: filter_keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    /// Fetch and parse an RSS/Atom feed. Entries whose link matches a filter
    /// keyword are dropped.
    pub(crate) async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>> {
        let resp = self
            .client
            .get(feed_url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| ArchiveError::fetch(feed_url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                url: feed_url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ArchiveError::fetch(feed_url, e))?;

        let entries = parse_entries(&bytes).map_err(|message| ArchiveError::FeedParse {
            url: feed_url.to_string(),
            message,
        })?;
        let total = entries.len();
        let entries = filter_entries(entries, &self.filter_keywords);

        info!(
            feed_url,
            items = entries.len(),
            filtered = total - entries.len(),
            "feed: parsed successfully"
        );

        Ok(entries)
    }
}

/// Parse feed bytes into entries in document order. Entries without a link
/// are skipped.
pub(crate) fn parse_entries(bytes: &[u8]) -> std::result::Result<Vec<FeedEntry>, String> {
    // Entries without a <guid> get their link as identifier.
    let parser = feed_rs::parser::Builder::new()
        .id_generator(|links, _title, _uri| {
            links.first().map(|l| l.href.trim().to_string()).unwrap_or_default()
        })
        .build();

    let feed = parser.parse(bytes).map_err(|e| e.to_string())?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.trim().to_string())?;
            if link.is_empty() {
                return None;
            }
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();
            let guid = match entry.id.trim() {
                "" => link.clone(),
                id => id.to_string(),
            };
            Some(FeedEntry { title, link, guid })
        })
        .collect())
}

/// Drop entries whose link contains any of `keywords` (already lowercased).
pub(crate) fn filter_entries(entries: Vec<FeedEntry>, keywords: &[String]) -> Vec<FeedEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let link = entry.link.to_lowercase();
            let blocked = keywords.iter().any(|k| link.contains(k.as_str()));
            if blocked {
                debug!(link = %entry.link, "feed: entry filtered by keyword");
            }
            !blocked
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>CdM</title>
    <link>https://www.cdm.me</link>
    <description>Vijesti</description>
    <item>
      <title> Skupština usvojila zakon </title>
      <link>https://www.cdm.me/politika/skupstina-usvojila-zakon/</link>
      <guid isPermaLink="false">https://www.cdm.me/?p=101</guid>
    </item>
    <item>
      <title>Derbi u Podgorici</title>
      <link>https://www.cdm.me/Sport/derbi-u-podgorici/</link>
    </item>
    <item>
      <title>Nestanak struje</title>
      <link>https://www.cdm.me/drustvo/nestanak-struje/</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_entries_in_order() {
        let entries = parse_entries(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "Skupština usvojila zakon");
        assert_eq!(entries[0].guid, "https://www.cdm.me/?p=101");
        assert_eq!(entries[2].link, "https://www.cdm.me/drustvo/nestanak-struje/");
    }

    #[test]
    fn guid_defaults_to_link() {
        let entries = parse_entries(RSS.as_bytes()).unwrap();
        assert_eq!(entries[2].guid, entries[2].link);
    }

    #[test]
    fn filter_is_case_insensitive_on_link() {
        let entries = parse_entries(RSS.as_bytes()).unwrap();
        let kept = filter_entries(entries, &["sport/".to_string()]);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| !e.link.contains("Sport")));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(parse_entries(b"not a feed").is_err());
    }
}
