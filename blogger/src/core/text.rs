//! Small text helpers shared by the stages.
//!
//! Word counts are whitespace-delimited tokens. Truncation counts characters,
//! never bytes, so multi-byte titles are never split mid-codepoint.

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// First `limit` whitespace tokens joined by single spaces.
pub fn first_words(text: &str, limit: usize) -> String {
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// First line of `text` (up to the first `\n`), truncated to `limit` characters.
pub fn first_line(text: &str, limit: usize) -> String {
    let line = text.split('\n').next().unwrap_or_default();
    truncate_chars(line, limit)
}

/// Filesystem-safe slug for a post title.
///
/// Lowercases, drops everything outside `[a-z0-9-_ ]`, maps spaces to `_`,
/// and keeps at most 160 characters.
pub fn slugify_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | ' '))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    truncate_chars(&kept, 160)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_helpers_split_on_any_whitespace() {
        let text = "one  two\nthree\tfour";
        assert_eq!(word_count(text), 4);
        assert_eq!(first_words(text, 3), "one two three");
        assert_eq!(first_words(text, 10), "one two three four");
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn first_line_truncates_by_chars() {
        assert_eq!(first_line("Intro to Caching\nWhy", 80), "Intro to Caching");
        assert_eq!(first_line("ééé", 2), "éé");
        assert_eq!(first_line("", 80), "");
    }

    #[test]
    fn slug_strips_punctuation_and_maps_spaces() {
        assert_eq!(slugify_title("  Intro to Caching! "), "intro_to_caching");
        assert_eq!(slugify_title("Rust: async-io & you"), "rust_async-io__you");
        assert_eq!(slugify_title("Ünïcode"), "ncode");
        assert_eq!(slugify_title(&"a".repeat(200)).len(), 160);
    }
}
