use vp_script::ScriptIndex;

use crate::input::Hypothesis;
use crate::position::{PositionChange, PositionController};

/// Script index plus cursor state, driven by recognizer hypotheses.
///
/// This is the piece a host feeds: load a script, push [`Hypothesis`] events
/// as they arrive, and forward any returned [`PositionChange`] to whatever
/// renders or syncs the cursor.
#[derive(Debug, Default)]
pub struct Tracker {
    index: ScriptIndex,
    position: PositionController,
    last_interim: Option<String>,
}

impl Tracker {
    pub fn new(script: &str) -> Self {
        let index = ScriptIndex::build(script);
        let position = PositionController::new(index.len());
        Self {
            index,
            position,
            last_interim: None,
        }
    }

    pub fn index(&self) -> &ScriptIndex {
        &self.index
    }

    pub fn position(&self) -> &PositionController {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut PositionController {
        &mut self.position
    }

    pub fn current(&self) -> usize {
        self.position.current()
    }

    /// Swap in a new script. Both cursors go back to the start.
    pub fn load(&mut self, script: &str) -> PositionChange {
        self.index = ScriptIndex::build(script);
        self.position.set_len(self.index.len());
        self.last_interim = None;
        self.position.reset()
    }

    pub fn process(&mut self, hypothesis: &Hypothesis) -> Option<PositionChange> {
        let text = hypothesis.text().trim();
        if text.is_empty() {
            return None;
        }

        match hypothesis {
            Hypothesis::Final { .. } => {
                self.last_interim = None;
                self.position.advance_from_final(&self.index, text)
            }
            Hypothesis::Interim { .. } => {
                if self.last_interim.as_deref() == Some(text) {
                    return None;
                }
                self.last_interim = Some(text.to_string());
                self.position.advance_from_interim(&self.index, text)
            }
        }
    }

    pub fn next_sentence(&self) -> usize {
        self.index.next_sentence(self.current())
    }

    pub fn prev_sentence(&self) -> usize {
        self.index.prev_sentence(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interim(text: &str) -> Hypothesis {
        Hypothesis::new(text, false)
    }

    fn fin(text: &str) -> Hypothesis {
        Hypothesis::new(text, true)
    }

    #[test]
    fn replays_a_recognition_stream() {
        let mut tracker = Tracker::new("Good evening everyone. Tonight we talk about tides.");

        let steps = [
            (interim("good"), Some(1)),
            (interim("good evening"), Some(2)),
            (interim("good evening"), None),
            (fin("good evening everyone"), Some(3)),
            (interim("tonight we"), Some(5)),
            (fin("tonight we talk"), Some(6)),
        ];

        for (hypothesis, expected) in steps {
            let change = tracker.process(&hypothesis);
            assert_eq!(change.map(|c| c.to), expected, "{hypothesis:?}");
        }

        assert_eq!(tracker.position().committed(), 6);
    }

    #[test]
    fn blank_hypotheses_are_ignored() {
        let mut tracker = Tracker::new("one two");
        assert!(tracker.process(&fin("   ")).is_none());
        assert!(tracker.process(&interim("")).is_none());
    }

    #[test]
    fn repeated_interim_after_final_is_processed() {
        let mut tracker = Tracker::new("one two three four");
        tracker.process(&interim("one two"));
        tracker.process(&fin("one"));
        assert_eq!(tracker.current(), 1);

        let change = tracker.process(&interim("one two")).unwrap();
        assert_eq!(change.to, 2);
    }

    #[test]
    fn load_resets_cursors() {
        let mut tracker = Tracker::new("one two three");
        tracker.process(&fin("one two"));

        let change = tracker.load("alpha beta. gamma");
        assert_eq!(change.to, 0);
        assert_eq!(tracker.current(), 0);
        assert_eq!(tracker.next_sentence(), 2);
    }

    #[test]
    fn sentence_navigation_uses_current() {
        let mut tracker = Tracker::new("A b. C d. E f.");
        tracker.position_mut().set_position(3, true);
        assert_eq!(tracker.next_sentence(), 4);
        assert_eq!(tracker.prev_sentence(), 2);
    }
}
