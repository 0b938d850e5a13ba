use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com", "dailymotion.com"];

static EMBEDS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("iframe[src], embed[src], video[src], video source[src]")
        .expect("valid selector")
});

/// Embedded video URLs: players from known video hosts and direct `<video>` sources.
pub(crate) fn extract_videos(doc: &Html, base: &Url) -> Vec<String> {
    let mut videos: Vec<String> = Vec::new();
    for el in doc.select(&EMBEDS) {
        let Some(src) = el.value().attr("src") else {
            continue;
        };
        let Ok(url) = base.join(src.trim()) else {
            continue;
        };
        let is_video_tag = matches!(el.value().name(), "video" | "source");
        let host = url.host_str().unwrap_or_default();
        let known_host = VIDEO_HOSTS
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{h}")));
        if (is_video_tag || known_host) && !videos.iter().any(|v| v == url.as_str()) {
            videos.push(url.to_string());
        }
    }
    videos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_video_players_and_sources() {
        let doc = Html::parse_document(
            r#"<iframe src="https://www.youtube.com/embed/abc"></iframe>
               <iframe src="https://www.facebook.com/plugins/post.php"></iframe>
               <video><source src="/media/klip.mp4"></video>
               <iframe src="https://www.youtube.com/embed/abc"></iframe>"#,
        );
        let videos = extract_videos(&doc, &Url::parse("https://www.vijesti.me/a").unwrap());
        assert_eq!(
            videos,
            vec![
                "https://www.youtube.com/embed/abc".to_string(),
                "https://www.vijesti.me/media/klip.mp4".to_string(),
            ]
        );
    }
}
