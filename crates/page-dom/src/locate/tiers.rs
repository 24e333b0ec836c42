//! Snippet matching over candidate texts
//!
//! Pure string work: given a snippet and the texts of the candidate nodes,
//! pick a node and an offset. Tiers run in order and the first hit wins.

/// Snippets must be longer than this (normalized) to try the prefix tier
pub const PREFIX_MIN_CHARS: usize = 20;
/// Words kept for the prefix tier
pub const PREFIX_WORDS: usize = 5;
/// Words must be longer than this to count in the fuzzy tier
pub const FUZZY_MIN_WORD_CHARS: usize = 3;
pub const FUZZY_MAX_WORDS: usize = 5;
pub const FUZZY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Prefix,
    Fuzzy,
}

/// Chosen candidate and character offset into its normalized text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMatch {
    pub candidate: usize,
    pub offset: usize,
    pub tier: MatchTier,
}

/// Trim, collapse whitespace runs to one space and lowercase
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn find_chars(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

fn first_containing(needle: &str, candidates: &[String], tier: MatchTier) -> Option<TextMatch> {
    candidates.iter().enumerate().find_map(|(candidate, text)| {
        find_chars(text, needle).map(|offset| TextMatch {
            candidate,
            offset,
            tier,
        })
    })
}

/// Best match for `snippet` among `candidates`, or `None` when every tier
/// misses. An empty snippet never matches.
pub fn find_best_match<S: AsRef<str>>(snippet: &str, candidates: &[S]) -> Option<TextMatch> {
    let needle = normalize(snippet);
    if needle.is_empty() {
        return None;
    }
    let texts: Vec<String> = candidates.iter().map(|c| normalize(c.as_ref())).collect();

    if let Some(found) = first_containing(&needle, &texts, MatchTier::Exact) {
        return Some(found);
    }

    if needle.chars().count() > PREFIX_MIN_CHARS {
        let prefix = needle
            .split(' ')
            .take(PREFIX_WORDS)
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(found) = first_containing(&prefix, &texts, MatchTier::Prefix) {
            return Some(found);
        }
    }

    fuzzy_match(&needle, &texts)
}

fn fuzzy_match(needle: &str, texts: &[String]) -> Option<TextMatch> {
    let words: Vec<&str> = needle
        .split(' ')
        .filter(|word| word.chars().count() > FUZZY_MIN_WORD_CHARS)
        .collect();
    if words.is_empty() {
        return None;
    }
    let leading = &words[..words.len().min(FUZZY_MAX_WORDS)];
    let denominator = leading.len() as f64;

    let mut best: Option<(usize, f64)> = None;
    for (candidate, text) in texts.iter().enumerate() {
        let hits = leading.iter().filter(|word| text.contains(*word)).count();
        let score = hits as f64 / denominator;
        if score >= FUZZY_THRESHOLD && best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    best.map(|(candidate, _)| TextMatch {
        candidate,
        offset: 0,
        tier: MatchTier::Fuzzy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Share your \n\t Personal   Information "), "share your personal information");
        assert_eq!(normalize(" \n "), "");
    }

    #[test]
    fn test_exact_tier_ignores_case_and_spacing() {
        let nodes = ["Intro text", "...share your  Personal   Information with..."];
        let found = find_best_match("personal information", &nodes).unwrap();
        assert_eq!(found.tier, MatchTier::Exact);
        assert_eq!(found.candidate, 1);
        assert_eq!(found.offset, 14);
    }

    #[test]
    fn test_prefix_tier_for_reworded_tail() {
        let nodes = ["We may share your personal data with advertisers."];
        let found = find_best_match(
            "We may share your personal information with partners",
            &nodes,
        )
        .unwrap();
        assert_eq!(found.tier, MatchTier::Prefix);
        assert_eq!(found.offset, 0);
    }

    #[test]
    fn test_prefix_tier_needs_long_snippet() {
        let nodes = ["a b c d e x"];
        assert_eq!(find_best_match("a b c d e f g", &nodes), None);

        let nodes = ["aa bb cc dd ee zz"];
        let found = find_best_match("aa bb cc dd ee ff gg hh", &nodes).unwrap();
        assert_eq!(found.tier, MatchTier::Prefix);
    }

    #[test]
    fn test_fuzzy_picks_highest_scoring_node() {
        let nodes = [
            "retain records with partners",
            "partners retain records indefinitely for audits",
        ];
        let found = find_best_match("records indefinitely retained by partners", &nodes).unwrap();
        assert_eq!(found.tier, MatchTier::Fuzzy);
        assert_eq!(found.candidate, 1);
        assert_eq!(found.offset, 0);
    }

    #[test]
    fn test_fuzzy_threshold() {
        let nodes = ["cookies are used here"];
        // 2 of 4 qualifying words present
        assert_eq!(find_best_match("cookies used for tracking visitors", &nodes), None);
    }

    #[test]
    fn test_fuzzy_ties_keep_first_node() {
        let nodes = ["tracking cookies", "cookies tracking"];
        let found = find_best_match("tracking cookies everywhere", &nodes).unwrap();
        assert_eq!(found.candidate, 0);
    }

    #[test]
    fn test_exact_wins_over_fuzzy_decoy() {
        let nodes = [
            "Partners may access browsing history and location data.",
            "We share browsing history with partners.",
        ];
        let found = find_best_match("share browsing history with partners", &nodes).unwrap();
        assert_eq!(found.tier, MatchTier::Exact);
        assert_eq!(found.candidate, 1);
    }

    #[test]
    fn test_empty_snippet_never_matches() {
        assert_eq!(find_best_match("   ", &["anything"]), None);
    }
}
