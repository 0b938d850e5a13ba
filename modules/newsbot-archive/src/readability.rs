// HTML → plain text transform via spider_transformations Readability.

use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};

/// Readability output with fewer words than this is considered a failed extraction.
pub(crate) const MIN_READABLE_WORDS: usize = 20;

/// Convert raw HTML bytes into the article's main text using Readability extraction.
pub(crate) fn html_to_text(html: &[u8], url: Option<&str>) -> String {
    let parsed_url = url.and_then(|u| url::Url::parse(u).ok());
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Text,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    format_paragraphs(&transform_content_input(input, &config))
}

/// One paragraph per non-blank line, separated by a blank line.
pub(crate) fn format_paragraphs(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Drop the trailing "Bonus video:" teaser some portals append to articles.
pub(crate) fn strip_bonus_video(text: &str) -> String {
    match text.find("Bonus video:") {
        Some(idx) => text[..idx].trim().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let text = "  First line \n\n\n second line\n   \nthird";
        assert_eq!(format_paragraphs(text), "First line\n\nsecond line\n\nthird");
    }

    #[test]
    fn counts_words() {
        assert_eq!(word_count("jedan  dva\ntri"), 3);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn cuts_bonus_video_tail() {
        let text = "Vlada je danas usvojila odluku.\n\nBonus video: snimak sa sjednice";
        assert_eq!(strip_bonus_video(text), "Vlada je danas usvojila odluku.");
        assert_eq!(strip_bonus_video("bez videa"), "bez videa");
    }
}
