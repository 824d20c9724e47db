use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// Anything that is not a letter, a number or an apostrophe. Combining marks
// (`\p{M}`) fall in here even where Unicode counts them as alphabetic.
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}']+").unwrap());

/// Canonicalize a script or spoken token so the two can be compared directly.
///
/// NFKD-decomposes, lower-cases, folds the curly apostrophes to `'`, then keeps
/// only letters, digits and apostrophes. Accents come out of the decomposition
/// as combining marks and are dropped, so `"Café"` and `"cafe"` compare equal.
///
/// An empty result means the token carries no word (pure punctuation, dashes,
/// emoji, ...) and callers should discard it.
pub fn normalize(token: &str) -> String {
    let decomposed: String = token.nfkd().collect();

    let folded: String = decomposed
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();

    NON_WORD.replace_all(&folded, "").into_owned()
}

/// Split a recognizer transcript into normalized words, dropping empties.
///
/// Recomputed on every call; hypotheses are short and the result is consumed
/// once per alignment pass.
pub fn split_spoken(transcript: &str) -> Vec<String> {
    transcript
        .split_whitespace()
        .map(normalize)
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize("Hello,"), "hello");
        assert_eq!(normalize("(WORLD)!"), "world");
        assert_eq!(normalize("2024."), "2024");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("Café"), "cafe");
        assert_eq!(normalize("Café"), normalize("cafe"));
        assert_eq!(normalize("naïve"), "naive");
    }

    #[test]
    fn folds_curly_apostrophes() {
        assert_eq!(normalize("you\u{2019}re"), "you're");
        assert_eq!(normalize("\u{2018}tis"), "'tis");
        assert_eq!(normalize("don't"), "don't");
    }

    #[test]
    fn compatibility_forms_are_folded() {
        assert_eq!(normalize("\u{FB01}nal"), "final");
        assert_eq!(normalize("x\u{00B2}"), "x2");
    }

    #[test]
    fn punctuation_only_is_empty() {
        assert_eq!(normalize("--"), "");
        assert_eq!(normalize("..."), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn non_latin_letters_survive() {
        assert_eq!(normalize("Привет"), "привет");
        assert_eq!(normalize("日本語"), "日本語");
    }

    #[test]
    fn vowel_marks_are_dropped() {
        assert_eq!(normalize("\u{643}\u{64E}\u{62A}\u{64E}\u{628}\u{64E}"), "\u{643}\u{62A}\u{628}");
        assert_eq!(normalize("كَتَبَ"), normalize("كتب"));
        assert_eq!(normalize("किताब"), "कतब");
        assert_eq!(normalize("किताब"), normalize("कताब"));
    }

    #[test]
    fn split_spoken_drops_empties() {
        assert_eq!(
            split_spoken("  The quick -- brown\tfox!  "),
            vec!["the", "quick", "brown", "fox"]
        );
        assert!(split_spoken("   ").is_empty());
        assert!(split_spoken("... !!").is_empty());
    }

    #[quickcheck]
    fn normalize_is_idempotent(input: String) -> bool {
        let once = normalize(&input);
        normalize(&once) == once
    }

    #[quickcheck]
    fn normalize_output_has_no_whitespace(input: String) -> bool {
        !normalize(&input).chars().any(char::is_whitespace)
    }
}
