// English-only closed-class words. The recognizer language does not change it.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "to", "of", "in", "on", "for", "with", "as", "at", "by",
    "from", "is", "are", "was", "were", "be", "been", "being", "it", "this", "that", "these",
    "those", "i", "you", "we", "they", "he", "she", "my", "your", "our", "their", "his", "her",
];

/// Weak words are too frequent to anchor a jump: they get a short lookahead
/// window and never match fuzzily.
pub(super) fn is_weak(word: &str) -> bool {
    word.chars().count() <= 3 || STOP_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_words_are_weak() {
        assert!(is_weak(""));
        assert!(is_weak("fox"));
        assert!(is_weak("日本語"));
        assert!(!is_weak("store"));
    }

    #[test]
    fn stop_words_are_weak() {
        assert!(is_weak("these"));
        assert!(is_weak("their"));
        assert!(is_weak("being"));
        assert!(!is_weak("teleprompter"));
    }
}
