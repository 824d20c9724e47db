use vp_script::ScriptIndex;

use crate::matcher::{AlignOptions, align};

/// Change notification produced whenever the displayed cursor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChange {
    pub from: usize,
    pub to: usize,
    /// Whether the new position was also committed.
    pub committed: bool,
}

impl PositionChange {
    /// Signed distance moved; negative means the cursor went backwards.
    pub fn delta(&self) -> isize {
        self.to as isize - self.from as isize
    }
}

/// Owns the two cursors of a running prompter.
///
/// `committed` is the base for the next alignment pass and only moves on
/// finalized results or explicit commands. `current` is what is on screen and
/// may run ahead of `committed` while an interim hypothesis is in flight.
#[derive(Debug, Clone, Default)]
pub struct PositionController {
    len: usize,
    current: usize,
    committed: usize,
}

impl PositionController {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            current: 0,
            committed: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn committed(&self) -> usize {
        self.committed
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adopt a new script length, clamping both cursors into range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.current = self.current.min(len);
        self.committed = self.committed.min(len);
    }

    pub fn set_position(&mut self, next: usize, commit: bool) -> PositionChange {
        let next = next.min(self.len);
        let change = PositionChange {
            from: self.current,
            to: next,
            committed: commit,
        };

        if commit {
            self.committed = next;
        }
        self.current = next;

        change
    }

    /// Make whatever is on screen the base for the next alignment.
    pub fn commit_current(&mut self) {
        self.committed = self.current;
    }

    pub fn reset(&mut self) -> PositionChange {
        let change = PositionChange {
            from: self.current,
            to: 0,
            committed: true,
        };
        self.current = 0;
        self.committed = 0;
        change
    }

    /// Align a finalized transcript from the committed cursor and commit the
    /// result if it moved. The display may move backwards here when an earlier
    /// interim preview overshot.
    pub fn advance_from_final(
        &mut self,
        index: &ScriptIndex,
        transcript: &str,
    ) -> Option<PositionChange> {
        let next = align(
            index,
            transcript,
            self.committed,
            &AlignOptions::final_pass(),
        );

        (next != self.committed).then(|| self.set_position(next, true))
    }

    /// Align an interim transcript from the committed cursor. Only moves the
    /// display forward and never commits.
    pub fn advance_from_interim(
        &mut self,
        index: &ScriptIndex,
        transcript: &str,
    ) -> Option<PositionChange> {
        let preview = align(
            index,
            transcript,
            self.committed,
            &AlignOptions::interim_pass(),
        );

        (preview > self.current).then(|| self.set_position(preview, false))
    }
}
