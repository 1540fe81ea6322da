// Case-insensitive exact-phrase containment

use crate::trigger::TriggerPhrase;

/// Lower-case `text`, trim it, and collapse whitespace runs to one space
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check whether `text` contains `phrase`, ignoring case and spacing.
///
/// Chunks with no recognizable speech (empty or whitespace only) never match.
pub fn contains_phrase(text: &str, phrase: &TriggerPhrase) -> bool {
    let normalized = normalize(text);
    !normalized.is_empty() && normalized.contains(phrase.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase(raw: &str) -> TriggerPhrase {
        TriggerPhrase::parse(raw).unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Please  HELP\tme\n"), "please help me");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_contains_phrase_case_insensitive() {
        assert!(contains_phrase("please Help Me now", &phrase("help me")));
        assert!(contains_phrase("HELP ME", &phrase("help me")));
    }

    #[test]
    fn test_contains_phrase_tolerates_extra_spacing() {
        assert!(contains_phrase("help    me", &phrase("help me")));
    }

    #[test]
    fn test_contains_phrase_with_punctuation_after() {
        assert!(contains_phrase("Help me!", &phrase("help me")));
    }

    #[test]
    fn test_no_match_when_words_are_split() {
        assert!(!contains_phrase("help someone near me", &phrase("help me")));
        assert!(!contains_phrase("me help", &phrase("help me")));
    }

    #[test]
    fn test_empty_chunk_never_matches() {
        assert!(!contains_phrase("", &phrase("help")));
        assert!(!contains_phrase("   \t ", &phrase("help")));
    }
}
