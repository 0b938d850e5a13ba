// Image extraction rules. Each rule yields (url, caption) pairs in document
// order; URLs lose their query string and are resolved against the page.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use newsbot_common::{clean_url, ArticleImage};

use super::collapse_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRule {
    /// Layout blocks shared by the WordPress/Elementor/Angular portals.
    Generic,
    /// investitor.me: the single post media wrapper under `#primary #main`.
    Investitor,
    /// rtcg.me: boxed images and figures inside the story container.
    Rtcg,
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static IMG: LazyLock<Selector> = LazyLock::new(|| sel("img"));
static FIGCAPTION: LazyLock<Selector> = LazyLock::new(|| sel("figcaption"));

static INVESTITOR_WRAP: LazyLock<Selector> =
    LazyLock::new(|| sel("div#primary main#main div.single-post-media-wrap"));
static INVESTITOR_DESC: LazyLock<Selector> = LazyLock::new(|| sel("div.single-post-media-desc"));

static RTCG_STORY: LazyLock<Selector> = LazyLock::new(|| sel("div.storyFull.fix"));
static RTCG_BOX: LazyLock<Selector> =
    LazyLock::new(|| sel("div.box-center div.boxImage, div.box-left div.boxImage, div.box-right div.boxImage"));
static RTCG_BOX_CAPTION: LazyLock<Selector> = LazyLock::new(|| sel("span.boxImageCaption"));
static FIGURE: LazyLock<Selector> = LazyLock::new(|| sel("figure"));
static FOOTER: LazyLock<Selector> = LazyLock::new(|| sel("footer"));

static ELEMENTOR: LazyLock<Selector> = LazyLock::new(|| sel("div.elementor-element"));
static ELEMENTOR_CAPTION: LazyLock<Selector> =
    LazyLock::new(|| sel("span.elementor-icon-list-text"));
static MAIN_ARTICLE_IMG: LazyLock<Selector> = LazyLock::new(|| sel("div.mainArticleImg"));
static BT_ARTICLE_BODY: LazyLock<Selector> = LazyLock::new(|| sel("div.btArticleBody"));
static S_FEAT_LIGHTBOX: LazyLock<Selector> =
    LazyLock::new(|| sel("div.s-feat div.featured-lightbox-trigger"));
static APP_ARTICLE_IMAGE: LazyLock<Selector> = LazyLock::new(|| sel("app-article-image"));
static PICTURE: LazyLock<Selector> = LazyLock::new(|| sel("picture"));
static SECTION: LazyLock<Selector> = LazyLock::new(|| sel("section"));
static HERALD_THUMB: LazyLock<Selector> = LazyLock::new(|| sel("div.herald-post-thumbnail"));
static NOSCRIPT: LazyLock<Selector> = LazyLock::new(|| sel("noscript"));
static WP_CAPTION: LazyLock<Selector> = LazyLock::new(|| sel("figure.wp-caption-text"));
static POST_CONTAINER: LazyLock<Selector> = LazyLock::new(|| sel("div.post-container.cf"));

impl ImageRule {
    pub fn extract(self, doc: &Html, base: &Url) -> Vec<ArticleImage> {
        let mut images = Images::new(base);
        match self {
            Self::Investitor => investitor(doc, &mut images),
            Self::Rtcg => rtcg(doc, &mut images),
            Self::Generic => generic(doc, &mut images),
        }
        debug!(rule = ?self, count = images.found.len(), "images: extracted");
        images.found
    }
}

/// Accumulator that cleans, resolves and de-duplicates image URLs.
struct Images<'a> {
    base: &'a Url,
    seen: HashSet<String>,
    found: Vec<ArticleImage>,
}

impl<'a> Images<'a> {
    fn new(base: &'a Url) -> Self {
        Self {
            base,
            seen: HashSet::new(),
            found: Vec::new(),
        }
    }

    fn add(&mut self, src: Option<&str>, caption: String) {
        let Some(src) = src.map(str::trim).filter(|s| !s.is_empty()) else {
            return;
        };
        if src.starts_with("data:") {
            return;
        }
        let Ok(resolved) = self.base.join(&clean_url(src)) else {
            return;
        };
        let url = resolved.to_string();
        if self.seen.insert(url.clone()) {
            self.found.push(ArticleImage::new(url, caption));
        }
    }
}

fn text_of(el: Option<ElementRef<'_>>) -> String {
    el.map(|e| collapse_whitespace(&e.text().collect::<String>()))
        .unwrap_or_default()
}

/// Largest `srcset` candidate, falling back to `src`.
fn best_src<'a>(img: &ElementRef<'a>) -> Option<&'a str> {
    img.value()
        .attr("srcset")
        .and_then(|set| set.rsplit(',').next())
        .and_then(|candidate| candidate.split_whitespace().next())
        .or_else(|| img.value().attr("src"))
}

fn investitor(doc: &Html, images: &mut Images<'_>) {
    if let Some(wrap) = doc.select(&INVESTITOR_WRAP).next() {
        if let Some(img) = wrap.select(&IMG).find(|i| i.value().attr("src").is_some()) {
            let caption = text_of(wrap.select(&INVESTITOR_DESC).next());
            images.add(img.value().attr("src"), caption);
        }
    }
}

fn rtcg(doc: &Html, images: &mut Images<'_>) {
    let Some(story) = doc.select(&RTCG_STORY).next() else {
        return;
    };
    for block in story.select(&RTCG_BOX) {
        if let Some(img) = block.select(&IMG).next() {
            let caption = text_of(block.select(&RTCG_BOX_CAPTION).next());
            images.add(img.value().attr("src"), caption);
        }
    }
    for figure in story.select(&FIGURE) {
        if let Some(img) = figure.select(&IMG).next() {
            let caption = text_of(
                figure
                    .select(&FIGCAPTION)
                    .next()
                    .or_else(|| figure.select(&FOOTER).next()),
            );
            images.add(img.value().attr("src"), caption);
        }
    }
}

fn generic(doc: &Html, images: &mut Images<'_>) {
    for div in doc.select(&ELEMENTOR) {
        let widget = div.value().attr("data-widget_type").unwrap_or_default();
        if !widget.contains("theme-post-featured-image") && !widget.contains("theme-post-content") {
            continue;
        }
        if let Some(img) = div.select(&IMG).find(|i| i.value().attr("src").is_some()) {
            let caption = text_of(
                div.select(&FIGCAPTION)
                    .next()
                    .or_else(|| div.select(&ELEMENTOR_CAPTION).next()),
            );
            images.add(best_src(&img), caption);
        }
    }

    for div in doc.select(&MAIN_ARTICLE_IMG) {
        if let Some(img) = div.select(&IMG).next() {
            images.add(img.value().attr("src"), String::new());
        }
    }

    for div in doc.select(&BT_ARTICLE_BODY) {
        for img in div.select(&IMG) {
            images.add(img.value().attr("src"), String::new());
        }
    }

    for trigger in doc.select(&S_FEAT_LIGHTBOX) {
        images.add(trigger.value().attr("data-source"), String::new());
    }

    for container in doc.select(&APP_ARTICLE_IMAGE).chain(doc.select(&PICTURE)) {
        if let Some(img) = container.select(&IMG).next() {
            images.add(best_src(&img), String::new());
        }
    }

    for section in doc.select(&SECTION) {
        if let Some(bg) = section.value().attr("data-bg") {
            images.add(Some(bg), String::new());
        } else if let Some(style) = section.value().attr("style") {
            images.add(background_image_url(style), String::new());
        }
    }

    for div in doc.select(&HERALD_THUMB) {
        let caption = text_of(div.select(&WP_CAPTION).next());
        // <noscript> content is raw text to the parser; re-parse it.
        match div.select(&NOSCRIPT).next() {
            Some(noscript) => {
                let fragment = Html::parse_fragment(&noscript.text().collect::<String>());
                if let Some(img) = fragment.select(&IMG).next() {
                    images.add(img.value().attr("src"), caption);
                }
            }
            None => {
                if let Some(img) = div.select(&IMG).next() {
                    images.add(img.value().attr("src"), caption);
                }
            }
        }
    }

    for div in doc.select(&POST_CONTAINER) {
        if let Some(img) = div.select(&IMG).next() {
            images.add(img.value().attr("src"), String::new());
        }
    }
}

/// `url(...)` value of a `background-image` declaration in an inline style.
fn background_image_url(style: &str) -> Option<&str> {
    if !style.contains("background-image") {
        return None;
    }
    let start = style.rfind("url(")? + 4;
    let rest = &style[start..];
    let end = rest.find(')')?;
    Some(rest[..end].trim().trim_matches(|c| c == '\'' || c == '"'))
}
