//! Greedy word wrapping by terminal display width.

use unicode_width::UnicodeWidthStr;

/// Wraps `text` so that no returned segment is wider than `width` columns.
///
/// Words are packed greedily and joined by a single space; runs of
/// whitespace collapse. A word wider than `width` is hard-broken at the
/// column limit. Embedded newlines force a break; an empty paragraph yields
/// an empty segment, so the result is never empty.
///
/// A `width` of 0 is treated as 1. Pure: identical input gives identical
/// output.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut segments = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;
        let mut any_word = false;

        for word in paragraph.split_whitespace() {
            any_word = true;
            let word_width = word.width();

            if word_width > width {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                let mut pieces = break_by_width(word, width);
                // Keep the tail open so following words can share its line.
                let last = pieces.pop().unwrap_or_default();
                segments.extend(pieces);
                current_width = last.width();
                current = last;
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else if current_width + 1 + word_width <= width {
                current.push(' ');
                current.push_str(word);
                current_width += 1 + word_width;
            } else {
                segments.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            }
        }

        if !current.is_empty() || !any_word {
            segments.push(current);
        }
    }

    segments
}

/// Splits a single word into pieces of at most `max_width` columns.
///
/// Each piece is measured as a whole string, so grapheme sequences such as
/// emoji presentation selectors count the same as in [`wrap_text`].
fn break_by_width(word: &str, max_width: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);

        if candidate.width() > max_width && !current.is_empty() {
            parts.push(std::mem::replace(&mut current, ch.to_string()));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_segment() {
        assert_eq!(wrap_text("hello world", 20), vec!["hello world"]);
    }

    #[test]
    fn test_greedy_wrap_at_whitespace() {
        assert_eq!(
            wrap_text("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_exact_fit() {
        assert_eq!(wrap_text("abcde fghij", 5), vec!["abcde", "fghij"]);
        assert_eq!(wrap_text("ab cd", 5), vec!["ab cd"]);
    }

    #[test]
    fn test_long_word_hard_broken() {
        assert_eq!(
            wrap_text("abcdefghijkl xy", 5),
            vec!["abcde", "fghij", "kl xy"]
        );
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(wrap_text("  a \t  b  ", 10), vec!["a b"]);
    }

    #[test]
    fn test_empty_and_newlines() {
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn test_wide_characters_respect_columns() {
        // Each CJK character is two columns wide.
        let segments = wrap_text("中文中文中文", 4);
        assert_eq!(segments, vec!["中文", "中文", "中文"]);
        assert!(segments.iter().all(|s| s.width() <= 4));
    }

    #[test]
    fn test_segments_never_exceed_width() {
        let text = "Early exit at [12.3.7] - Condition met, skipping 13 remaining iterations \
                    with_an_unreasonably_long_identifier_that_needs_breaking";
        for width in 1..40 {
            for segment in wrap_text(text, width) {
                assert!(segment.width() <= width, "{segment:?} wider than {width}");
            }
        }
    }

    #[test]
    fn test_wrap_is_deterministic() {
        let text = "Outer iteration 3/10 started - Processing 5 sub-tasks with 10 steps each";
        assert_eq!(wrap_text(text, 17), wrap_text(text, 17));
    }

    #[test]
    fn test_zero_width_treated_as_one() {
        assert_eq!(wrap_text("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_emoji_sequences_broken_within_width() {
        let segments = wrap_text("\u{2764}\u{fe0f}\u{2764}\u{fe0f}\u{2764}\u{fe0f}", 4);
        for segment in &segments {
            assert!(segment.width() <= 4, "{segment:?} wider than 4");
        }
        assert_eq!(segments.concat().chars().count(), 6);
    }

    #[test]
    fn test_control_characters_broken_within_width() {
        let segments = wrap_text("a\u{7}\u{7}\u{7}b", 2);
        for segment in &segments {
            assert!(segment.width() <= 2, "{segment:?} wider than 2");
        }
        assert_eq!(segments.concat(), "a\u{7}\u{7}\u{7}b");
    }
}
