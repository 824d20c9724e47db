//! # Spoken-word alignment
//!
//! Walks the recognized words one by one and moves a cursor through the
//! script. Each word either hits the script word under the cursor (exactly or
//! fuzzily), hits a word a little further ahead (the speaker skipped or the
//! recognizer dropped something), or is ignored. The cursor never moves
//! backwards within one call.
//!
//! Short and stop-list words are "weak": they only look two words ahead and
//! never match fuzzily, so a stray "the" cannot drag the cursor across a
//! paragraph. Jumps of four or more words additionally need the following
//! spoken word to agree with the script right after the landing spot.

mod fuzzy;
mod weak;

use vp_script::{ScriptIndex, split_spoken};

use fuzzy::fuzzy_eq;
use weak::is_weak;

/// Jumps at least this far ahead need a second spoken word to agree.
const CORROBORATE_JUMP: usize = 4;
const WEAK_LOOKAHEAD: usize = 2;
const MIN_FUZZY_AHEAD_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignOptions {
    pub lookahead: usize,
    pub allow_lookahead: bool,
    pub allow_fuzzy: bool,
    pub allow_fuzzy_ahead: bool,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            lookahead: 12,
            allow_lookahead: true,
            allow_fuzzy: true,
            allow_fuzzy_ahead: true,
        }
    }
}

impl AlignOptions {
    /// Settings for finalized results, whose outcome gets committed.
    pub fn final_pass() -> Self {
        Self {
            lookahead: 14,
            ..Self::default()
        }
    }

    /// Settings for interim results: a narrower window and no fuzzy search
    /// ahead, since the outcome is only a display preview.
    pub fn interim_pass() -> Self {
        Self {
            lookahead: 6,
            allow_fuzzy_ahead: false,
            ..Self::default()
        }
    }
}

/// Align a raw transcript against `index` starting at `start`.
pub fn align(index: &ScriptIndex, transcript: &str, start: usize, options: &AlignOptions) -> usize {
    align_words(index, &split_spoken(transcript), start, options)
}

/// Align already-normalized spoken words. Returns a cursor in
/// `start.min(len)..=len`.
pub fn align_words(
    index: &ScriptIndex,
    spoken: &[String],
    start: usize,
    options: &AlignOptions,
) -> usize {
    let len = index.len();
    let mut pos = start.min(len);

    for (i, word) in spoken.iter().enumerate() {
        if pos >= len {
            break;
        }
        if word.is_empty() {
            continue;
        }

        let weak = is_weak(word);

        if let Some(found) = match_at_cursor(index, word, pos, weak, options)
            .or_else(|| match_ahead(index, word, pos, weak, options))
        {
            if found - pos >= CORROBORATE_JUMP
                && let Some(next) = spoken.get(i + 1)
                && !corroborates(index, next, found)
            {
                tracing::trace!(word = %word, from = pos, to = found, "alignment_jump_rejected");
                continue;
            }
            pos = found + 1;
        }
    }

    pos
}

fn match_at_cursor(
    index: &ScriptIndex,
    word: &str,
    pos: usize,
    weak: bool,
    options: &AlignOptions,
) -> Option<usize> {
    let script_word = index.normalized(pos)?;

    if word == script_word || (options.allow_fuzzy && !weak && fuzzy_eq(word, script_word)) {
        Some(pos)
    } else {
        None
    }
}

fn match_ahead(
    index: &ScriptIndex,
    word: &str,
    pos: usize,
    weak: bool,
    options: &AlignOptions,
) -> Option<usize> {
    if !options.allow_lookahead {
        return None;
    }

    let max_ahead = if weak {
        options.lookahead.min(WEAK_LOOKAHEAD)
    } else {
        options.lookahead
    };
    let window = (pos + 1)..=pos.saturating_add(max_ahead).min(index.len().saturating_sub(1));

    let exact = window
        .clone()
        .find(|&j| index.normalized(j) == Some(word));
    if exact.is_some() {
        return exact;
    }

    if options.allow_fuzzy_ahead && !weak && word.chars().count() >= MIN_FUZZY_AHEAD_CHARS {
        return window.into_iter().find(|&j| {
            index
                .normalized(j)
                .is_some_and(|script_word| fuzzy_eq(word, script_word))
        });
    }

    None
}

/// Does `next` agree with one of the two script words after `found`?
///
/// The nearer candidate is checked first; either one agreeing accepts the jump.
fn corroborates(index: &ScriptIndex, next: &str, found: usize) -> bool {
    let next_weak = is_weak(next);

    [found + 1, found + 2].into_iter().any(|j| {
        index.normalized(j).is_some_and(|script_word| {
            next == script_word || (!next_weak && fuzzy_eq(next, script_word))
        })
    })
}
