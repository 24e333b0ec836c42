//! Offset and snippet helpers shared by both detectors
//!
//! All offsets here are character offsets (Unicode scalar values), not byte
//! offsets, so they line up with what the page locator counts.

/// Characters of context kept on each side of a match
pub const CONTEXT_RADIUS: usize = 200;

/// Convert a byte index into `text` to a character offset
pub fn char_offset(text: &str, byte_index: usize) -> usize {
    text[..byte_index].chars().count()
}

/// Byte index of the `char_index`-th character, clamped to the end of `text`
pub fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    &text[..byte_index(text, max_chars)]
}

/// Character offset of the first exact occurrence of `needle`
pub fn first_occurrence(text: &str, needle: &str) -> Option<usize> {
    text.find(needle).map(|idx| char_offset(text, idx))
}

/// Character offset of the first case-insensitive occurrence of `needle`
pub fn first_occurrence_ignore_case(text: &str, needle: &str) -> Option<usize> {
    let haystack = text.to_lowercase();
    let needle = needle.to_lowercase();
    haystack
        .find(&needle)
        .map(|idx| char_offset(&haystack, idx))
}

/// Window of up to [`CONTEXT_RADIUS`] characters either side of a match,
/// trimmed of surrounding whitespace.
pub fn extract_context(text: &str, start: usize, match_len: usize) -> String {
    let total = text.chars().count();
    let from = start.saturating_sub(CONTEXT_RADIUS);
    let to = (start + match_len + CONTEXT_RADIUS).min(total);

    if from >= to {
        return String::new();
    }

    let begin = byte_index(text, from);
    let end = byte_index(text, to);
    text[begin..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_clamped_to_text() {
        let text = "We sell data.";
        assert_eq!(extract_context(text, 3, 4), "We sell data.");
    }

    #[test]
    fn test_context_window_radius() {
        let text = format!("{}MATCH{}", "a".repeat(300), "b".repeat(300));
        let context = extract_context(&text, 300, 5);
        assert_eq!(context.chars().count(), 405);
        assert!(context.starts_with('a'));
        assert!(context.contains("MATCH"));
    }

    #[test]
    fn test_offsets_count_characters() {
        let text = "Données partagées avec des tiers";
        let offset = first_occurrence(text, "partagées").unwrap();
        assert_eq!(offset, 8);
        assert_eq!(first_occurrence_ignore_case(text, "AVEC"), Some(18));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
