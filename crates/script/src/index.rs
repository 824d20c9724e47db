use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::normalize;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

// "word.", "word!", "word?" with optional closing quotes/brackets after the mark.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]["'\u{2019}\u{201D})\]]*$"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScriptWord {
    /// The token exactly as it appears in the script, punctuation included.
    pub text: String,
    pub normalized: String,
    /// Byte range of `text` inside the script it was built from.
    pub span: Range<usize>,
}

/// Word-level index over a script.
///
/// Positions are word offsets in `0..=len()`; `len()` means "past the last
/// word". Tokens that normalize to nothing are not indexed, so every index
/// refers to a real word. The index is immutable: a script edit builds a new
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptIndex {
    words: Vec<ScriptWord>,
    sentence_starts: Vec<usize>,
}

impl ScriptIndex {
    pub fn build(script: &str) -> Self {
        let mut words = Vec::new();
        let mut sentence_starts = vec![0];

        for token in TOKEN.find_iter(script) {
            let normalized = normalize(token.as_str());
            if !normalized.is_empty() {
                words.push(ScriptWord {
                    text: token.as_str().to_string(),
                    normalized,
                    span: token.range(),
                });
            }

            // A punctuation-only token ("...", "?!") still ends the sentence.
            if SENTENCE_END.is_match(token.as_str())
                && sentence_starts.last() != Some(&words.len())
            {
                sentence_starts.push(words.len());
            }
        }

        // A boundary after the final word does not start a sentence.
        if sentence_starts.len() > 1 && sentence_starts.last() == Some(&words.len()) {
            sentence_starts.pop();
        }

        Self {
            words,
            sentence_starts,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[ScriptWord] {
        &self.words
    }

    pub fn word(&self, index: usize) -> Option<&ScriptWord> {
        self.words.get(index)
    }

    pub fn normalized(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(|w| w.normalized.as_str())
    }

    /// Always starts with `0` and is strictly increasing.
    pub fn sentence_starts(&self) -> &[usize] {
        &self.sentence_starts
    }

    /// First sentence start strictly after `from`, or `len()` if there is none.
    pub fn next_sentence(&self, from: usize) -> usize {
        let i = self.sentence_starts.partition_point(|&s| s <= from);
        self.sentence_starts.get(i).copied().unwrap_or(self.len())
    }

    /// Last sentence start strictly before `from`, or `0` if there is none.
    pub fn prev_sentence(&self, from: usize) -> usize {
        let i = self.sentence_starts.partition_point(|&s| s < from);
        if i == 0 {
            0
        } else {
            self.sentence_starts[i - 1]
        }
    }
}

impl Default for ScriptIndex {
    fn default() -> Self {
        Self::build("")
    }
}
