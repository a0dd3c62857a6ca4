/// Apostrophe look-alikes folded to `'` before answers are compared.
const APOSTROPHE_VARIANTS: [char; 6] = [
    '\u{2019}', // right single quotation mark
    '\u{2018}', // left single quotation mark
    '\u{201B}', // single high-reversed-9 quotation mark
    '\u{2032}', // prime
    '\u{0060}', // grave accent
    '\u{00B4}', // acute accent
];

/// Canonicalize apostrophe variants to the ASCII apostrophe
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if APOSTROPHE_VARIANTS.contains(&c) { '\'' } else { c })
        .collect()
}

fn canonical(text: &str) -> String {
    normalize(text).trim().to_lowercase()
}

/// Score a response: the normalized expected answer must be contained in the
/// normalized response. An empty response never scores; an empty expected
/// answer matches any non-empty response.
pub fn is_correct(expected: &str, actual: &str) -> bool {
    if actual.is_empty() {
        tracing::debug!("Model response is empty");
        return false;
    }

    canonical(actual).contains(&canonical(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_maps_every_variant() {
        let input = "a\u{2019}b\u{2018}c\u{201B}d\u{2032}e\u{0060}f\u{00B4}g";
        assert_eq!(normalize(input), "a'b'c'd'e'f'g");
    }

    #[test]
    fn test_normalize_passes_through_plain_text() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("plain \"quoted\" text"), "plain \"quoted\" text");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for text in ["", "don\u{2019}t", "it's `fine`", "caf\u{00E9} \u{00B4}x\u{00B4}", "\u{2032}\u{2032}"] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_curly_expected_matches_straight_response() {
        assert!(is_correct("don\u{2019}t", "I don't know"));
    }

    #[test]
    fn test_straight_expected_matches_curly_response() {
        assert!(is_correct("don't", "I don\u{2019}t know"));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(is_correct("  Paris  ", "the capital is paris."));
    }

    #[test]
    fn test_containment_not_equality() {
        assert!(is_correct("yes", "yes, absolutely"));
        assert!(!is_correct("yes and no", "yes"));
    }

    #[test]
    fn test_empty_expected_answer_matches_anything() {
        assert!(is_correct("", "anything"));
    }

    #[test]
    fn test_empty_response_never_correct() {
        for expected in ["", "yes", "  Paris ", "don\u{2019}t"] {
            assert!(!is_correct(expected, ""));
        }
    }

    #[test]
    fn test_whitespace_only_response_with_empty_expected() {
        // Not empty before trimming, so the empty expected answer still matches.
        assert!(is_correct("", "   "));
        assert!(!is_correct("a", "   "));
    }
}
