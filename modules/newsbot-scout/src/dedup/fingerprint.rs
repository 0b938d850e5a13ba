use newsbot_common::content_hash;

/// Collapse every run of whitespace to one space and trim both ends.
pub fn normalize(body: &str) -> String {
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `length` characters of `text` starting at character `offset`. Shorter
/// texts yield a partial or empty window.
pub fn hash_window(text: &str, offset: usize, length: usize) -> &str {
    let start = byte_index(text, offset);
    let end = start + byte_index(&text[start..], length);
    &text[start..end]
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// SHA-256 hex of the normalized body window followed by the trimmed title.
pub fn content_fingerprint(title: &str, body: &str, offset: usize, length: usize) -> String {
    let normalized = normalize(body);
    content_hash([hash_window(&normalized, offset, length), title.trim()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Vlada \n\n je\tdanas  "), "Vlada je danas");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn window_counts_characters() {
        let text = "čćžšđ".repeat(10);
        let window = hash_window(&text, 3, 4);
        assert_eq!(window, "šđčć");
    }

    #[test]
    fn short_text_gives_partial_or_empty_window() {
        assert_eq!(hash_window("kratko", 50, 200), "");
        assert_eq!(hash_window("abcdef", 2, 200), "cdef");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let body = "x".repeat(300);
        assert_eq!(
            content_fingerprint("Naslov", &body, 50, 200),
            content_fingerprint("Naslov", &body, 50, 200)
        );
    }

    #[test]
    fn one_changed_character_in_window_changes_hash() {
        let body: String = ('a'..='z').cycle().take(300).collect();
        let mut changed: Vec<char> = body.chars().collect();
        changed[100] = if changed[100] == 'Z' { 'Y' } else { 'Z' };
        let changed: String = changed.into_iter().collect();
        assert_ne!(
            content_fingerprint("T", &body, 50, 200),
            content_fingerprint("T", &changed, 50, 200)
        );
    }

    #[test]
    fn changes_outside_window_do_not_matter() {
        let body: String = ('a'..='z').cycle().take(300).collect();
        let changed = format!("Q{}", &body[1..]);
        assert_eq!(
            content_fingerprint("T", &body, 50, 200),
            content_fingerprint("T", &changed, 50, 200)
        );
    }

    #[test]
    fn whitespace_differences_are_ignored() {
        let a = format!("{} kraj", "riječ ".repeat(60));
        let b = format!("{}\n\nkraj", "riječ  ".repeat(60));
        assert_eq!(
            content_fingerprint("T", &a, 50, 200),
            content_fingerprint("T", &b, 50, 200)
        );
    }

    #[test]
    fn title_is_part_of_hash() {
        let body = "y".repeat(300);
        assert_ne!(
            content_fingerprint("A", &body, 50, 200),
            content_fingerprint("B", &body, 50, 200)
        );
    }
}
