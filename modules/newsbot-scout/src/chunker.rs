//! Splitting article text into Telegram-sized messages.
//!
//! Every length here is counted in characters, not bytes.

use tracing::{debug, warn};

/// Fixed text wrapped around each part of a long message.
#[derive(Debug, Clone)]
pub struct Decorations {
    /// Prepended to every part by the sender, e.g. `<b>Title</b>\n\n`.
    pub title: String,
    /// Appended to every part except the last.
    pub continuation: String,
    /// Appended to the last part only.
    pub final_suffix: String,
}

impl Decorations {
    pub fn new(title: impl Into<String>, continuation: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            continuation: continuation.into(),
            final_suffix: String::new(),
        }
    }

    pub fn with_final_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.final_suffix = suffix.into();
        self
    }
}

/// One message body: a slice of the article plus its trailing decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub core: String,
    pub tail: String,
}

impl MessagePart {
    pub fn text(&self) -> String {
        format!("{}{}", self.core, self.tail)
    }
}

/// `\n\n<a href="link">label</a>\n\ntags`, or empty unless both a link and
/// tags are present.
pub fn read_more_suffix(link: Option<&str>, label: &str, tags: &str) -> String {
    match link {
        Some(link) if !link.is_empty() && !tags.is_empty() => {
            format!("\n\n<a href=\"{link}\">{label}</a>\n\n{tags}")
        }
        _ => String::new(),
    }
}

/// Split `content` into parts that fit `max_length` once the title decoration
/// and continuation marker are added. The final suffix is not budgeted.
///
/// Parts are cut at exactly the available width; the remainder is trimmed
/// before the next iteration. Stops early if a part would repeat the
/// previous one.
///
/// Lengths are counted on raw text. Callers escape HTML afterwards, so a
/// rendered part may exceed `max_length` in markup characters; Telegram
/// measures the text after entity parsing, which stays within budget.
pub fn chunk_message(content: &str, max_length: usize, decorations: &Decorations) -> Vec<MessagePart> {
    let available = max_length
        .saturating_sub(char_len(&decorations.title))
        .saturating_sub(char_len(&decorations.continuation));

    let mut parts: Vec<MessagePart> = Vec::new();
    let mut remaining = content;

    while !remaining.is_empty() {
        let part = if available > 0 && char_len(remaining) > available {
            let cut = byte_offset(remaining, available);
            let part = MessagePart {
                core: remaining[..cut].trim().to_string(),
                tail: decorations.continuation.clone(),
            };
            remaining = remaining[cut..].trim();
            part
        } else if available == 0 {
            warn!(max_length, "chunker: decorations leave no room for content");
            break;
        } else {
            let part = MessagePart {
                core: remaining.trim().to_string(),
                tail: decorations.final_suffix.clone(),
            };
            remaining = "";
            part
        };

        if parts.last().is_some_and(|prev| prev.text() == part.text()) {
            warn!(chars = char_len(&part.core), "chunker: repeated part detected, stopping");
            break;
        }
        debug!(chars = char_len(&part.core), "chunker: part");
        parts.push(part);
    }

    parts
}

/// Split `content` near `max_length` without breaking words.
///
/// Prefers the last space at or before `max_length`, then the first one after
/// it, then a mid-word cut. A remainder shorter than five characters is pulled
/// into the head, as is punctuation that would otherwise open the remainder.
pub fn split_content_by_length(content: &str, max_length: usize) -> (String, String) {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= max_length {
        return (content.to_string(), String::new());
    }

    let find_space_from = |from: usize| (from..chars.len()).find(|&i| chars[i] == ' ');

    let mut split = chars[..max_length]
        .iter()
        .rposition(|&c| c == ' ')
        .or_else(|| find_space_from(max_length))
        .unwrap_or(max_length);

    let tail_len = collect(&chars[split..]).trim().chars().count();
    if tail_len < 5 {
        if let Some(next) = find_space_from(split + 1) {
            split = next;
        }
    }

    while split + 1 < chars.len() && matches!(chars[split + 1], ',' | '.' | '!' | '?') {
        match find_space_from(split + 1) {
            Some(next) => split = next,
            None => break,
        }
    }

    (
        collect(&chars[..split]).trim().to_string(),
        collect(&chars[split..]).trim().to_string(),
    )
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "\n\n<b>Продолжение следует...</b>";

    fn decorations(title_len: usize, marker_len: usize) -> Decorations {
        Decorations::new("t".repeat(title_len), "m".repeat(marker_len))
    }

    fn alphabet(len: usize) -> String {
        ('a'..='z').cycle().take(len).collect()
    }

    #[test]
    fn short_content_is_one_part_with_suffix() {
        let deco = Decorations::new("<b>Naslov</b>\n\n", MARKER)
            .with_final_suffix(read_more_suffix(Some("https://cdm.me/a"), "Читать на сайте", "#CDM"));
        let parts = chunk_message("  Kratak tekst.  ", 4000, &deco);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].core, "Kratak tekst.");
        assert_eq!(
            parts[0].tail,
            "\n\n<a href=\"https://cdm.me/a\">Читать на сайте</a>\n\n#CDM"
        );
    }

    #[test]
    fn nine_thousand_chars_make_three_parts() {
        let content = alphabet(9000);
        let parts = chunk_message(&content, 4000, &decorations(20, 30));
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].core.chars().count(), 3950);
        assert_eq!(parts[1].core.chars().count(), 3950);
        assert_eq!(parts[2].core.chars().count(), 1100);
        assert_eq!(parts[0].tail, "m".repeat(30));
        assert_eq!(parts[2].tail, "");
    }

    #[test]
    fn parts_fit_the_budget() {
        let deco = decorations(20, 30);
        let content = "riječ ".repeat(2000);
        for part in chunk_message(&content, 4000, &deco) {
            let total = deco.title.chars().count() + part.text().chars().count();
            assert!(total <= 4000, "part of {total} chars");
        }
    }

    #[test]
    fn concatenated_cores_reproduce_content() {
        let content = "Vlada je usvojila   odluku o budžetu. ".repeat(300);
        let parts = chunk_message(&content, 1000, &decorations(10, 10));
        let joined: String = parts.iter().map(|p| p.core.as_str()).collect();
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&joined), strip(content.trim()));
    }

    #[test]
    fn no_identical_consecutive_parts() {
        let content = "a".repeat(10_000);
        let parts = chunk_message(&content, 1000, &decorations(0, 0));
        assert_eq!(parts.len(), 1);

        let content = alphabet(10_000);
        let parts = chunk_message(&content, 1000, &decorations(0, 0));
        for pair in parts.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn decorations_wider_than_limit_emit_nothing() {
        assert!(chunk_message("text", 10, &decorations(8, 8)).is_empty());
    }

    #[test]
    fn empty_content_has_no_parts() {
        assert!(chunk_message("", 4000, &decorations(10, 10)).is_empty());
    }

    #[test]
    fn suffix_needs_link_and_tags() {
        assert_eq!(read_more_suffix(None, "Читать на сайте", "#CDM"), "");
        assert_eq!(read_more_suffix(Some("https://a"), "Читать на сайте", ""), "");
    }

    #[test]
    fn split_prefers_last_space_before_limit() {
        assert_eq!(
            split_content_by_length("The quick brown fox jumps.", 10),
            ("The quick".to_string(), "brown fox jumps.".to_string())
        );
    }

    #[test]
    fn split_fits_untouched() {
        assert_eq!(
            split_content_by_length("kratko", 10),
            ("kratko".to_string(), String::new())
        );
    }

    #[test]
    fn split_uses_next_space_when_none_before() {
        assert_eq!(
            split_content_by_length("Supercalifragilistic is long", 5),
            ("Supercalifragilistic".to_string(), "is long".to_string())
        );
    }

    #[test]
    fn split_mid_word_without_spaces() {
        assert_eq!(
            split_content_by_length("abcdefghij", 4),
            ("abcd".to_string(), "efghij".to_string())
        );
    }

    #[test]
    fn split_pulls_short_tail_into_head() {
        assert_eq!(
            split_content_by_length("alpha beta gamma a b", 17),
            ("alpha beta gamma a".to_string(), "b".to_string())
        );
        // No later space: the short tail stays.
        assert_eq!(
            split_content_by_length("alpha beta gamma ab", 17),
            ("alpha beta gamma".to_string(), "ab".to_string())
        );
    }

    #[test]
    fn split_skips_leading_punctuation() {
        assert_eq!(
            split_content_by_length("Hello world , and more words", 12),
            ("Hello world ,".to_string(), "and more words".to_string())
        );
    }

    #[test]
    fn split_counts_characters() {
        let (head, tail) = split_content_by_length("čćžš đđđđ šššš", 6);
        assert_eq!(head, "čćžš");
        assert_eq!(tail, "đđđđ šššš");
    }
}
