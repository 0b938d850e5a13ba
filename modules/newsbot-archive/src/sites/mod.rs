// Site registry: per-host body selectors and image rules.
// The generic Readability pass handles most pages; these extractors are the
// fallback for portals whose markup defeats it.

mod images;
mod media;

use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use newsbot_common::ArticleImage;

pub use images::ImageRule;
pub(crate) use media::extract_videos;

/// Site-specific extraction for one news portal.
pub trait SiteExtractor: Send + Sync {
    /// Registrable domain this extractor handles, e.g. `vijesti.me`.
    fn domain(&self) -> &str;

    /// Article body from the site's known container, paragraphs separated by a
    /// blank line. `None` when the container is missing or empty.
    fn extract_body(&self, doc: &Html) -> Option<String>;

    fn extract_images(&self, doc: &Html, base: &Url) -> Vec<ArticleImage>;
}

/// Extractor driven by a CSS container selector and an image rule.
pub struct SelectorSite {
    domain: String,
    container: Selector,
    container_css: String,
    images: ImageRule,
}

impl SelectorSite {
    pub fn new(domain: &str, container_css: &str, images: ImageRule) -> anyhow::Result<Self> {
        let container = Selector::parse(container_css)
            .map_err(|e| anyhow::anyhow!("Invalid selector {container_css:?}: {e:?}"))?;
        Ok(Self {
            domain: domain.to_string(),
            container,
            container_css: container_css.to_string(),
            images,
        })
    }
}

impl SiteExtractor for SelectorSite {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn extract_body(&self, doc: &Html) -> Option<String> {
        let text = extract_paragraphs(doc, &self.container);
        if text.is_none() {
            warn!(domain = %self.domain, selector = %self.container_css, "site: no article body found");
        }
        text
    }

    fn extract_images(&self, doc: &Html, base: &Url) -> Vec<ArticleImage> {
        self.images.extract(doc, base)
    }
}

/// Text of every `<p>` under the first element matching `container`.
pub(crate) fn extract_paragraphs(doc: &Html, container: &Selector) -> Option<String> {
    static P: std::sync::LazyLock<Selector> =
        std::sync::LazyLock::new(|| Selector::parse("p").expect("valid selector"));

    let body = doc.select(container).next()?;
    let text = body
        .select(&P)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    (!text.is_empty()).then_some(text)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Registry of site extractors keyed by host.
pub struct SiteRegistry {
    sites: Vec<Box<dyn SiteExtractor>>,
}

impl SiteRegistry {
    pub fn empty() -> Self {
        Self { sites: Vec::new() }
    }

    /// The Montenegrin portals the bot follows.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let mut registry = Self::empty();
        for (domain, css, images) in [
            ("vijesti.me", r#"div[itemprop="articleBody"]"#, ImageRule::Generic),
            ("bankar.me", "div.entry-content", ImageRule::Generic),
            ("rtcg.me", "div.storyFull.fix", ImageRule::Rtcg),
            ("podgorica.me", "div.elementor-widget-theme-post-content", ImageRule::Generic),
            ("cdm.me", "div.entry-content.herald-entry-content", ImageRule::Generic),
            ("mans.co.me", "div.post-content.description", ImageRule::Generic),
            ("investitor.me", "div.entry-content.clearfix", ImageRule::Investitor),
        ] {
            registry.register(Box::new(SelectorSite::new(domain, css, images)?));
        }
        Ok(registry)
    }

    pub fn register(&mut self, site: Box<dyn SiteExtractor>) {
        self.sites.push(site);
    }

    /// Extractor whose domain equals the URL's host or is a parent of it.
    pub fn for_url(&self, url: &str) -> Option<&dyn SiteExtractor> {
        let host = Url::parse(url).ok()?.host_str()?.to_lowercase();
        self.sites
            .iter()
            .find(|site| {
                let domain = site.domain();
                host == domain || host.ends_with(&format!(".{domain}"))
            })
            .map(|site| site.as_ref())
    }

    /// Images via the site's rule, or the generic rules for unknown hosts.
    pub fn extract_images(&self, doc: &Html, url: &str) -> Vec<ArticleImage> {
        let Ok(base) = Url::parse(url) else {
            return Vec::new();
        };
        match self.for_url(url) {
            Some(site) => site.extract_images(doc, &base),
            None => ImageRule::Generic.extract(doc, &base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_matches_host_and_subdomains() {
        let registry = SiteRegistry::with_defaults().unwrap();
        assert_eq!(
            registry.for_url("https://www.vijesti.me/vijesti/drustvo/1").map(|s| s.domain()),
            Some("vijesti.me")
        );
        assert_eq!(
            registry.for_url("https://rtcg.me/vijesti/1.html").map(|s| s.domain()),
            Some("rtcg.me")
        );
        assert!(registry.for_url("https://balkaninsight.com/2024/01/01/a/").is_none());
        assert!(registry.for_url("https://notvijesti.me/").is_none());
        assert!(registry.for_url("not a url").is_none());
    }

    #[test]
    fn selector_site_joins_paragraphs() {
        let registry = SiteRegistry::with_defaults().unwrap();
        let doc = Html::parse_document(
            r#"<div itemprop="articleBody"><p>Prvi   pasus
            teksta.</p><p> </p><p>Drugi <b>pasus</b>.</p></div>"#,
        );
        let site = registry.for_url("https://www.vijesti.me/a").unwrap();
        assert_eq!(
            site.extract_body(&doc).as_deref(),
            Some("Prvi pasus teksta.\n\nDrugi pasus.")
        );
    }

    #[test]
    fn missing_container_yields_none() {
        let registry = SiteRegistry::with_defaults().unwrap();
        let doc = Html::parse_document("<div class='other'><p>text</p></div>");
        let site = registry.for_url("https://bankar.me/a").unwrap();
        assert!(site.extract_body(&doc).is_none());
    }

    #[test]
    fn invalid_selector_is_an_error() {
        assert!(SelectorSite::new("x.me", "div[", ImageRule::Generic).is_err());
    }
}
