use vp_tracker::PositionChange;

/// Changes a display surface applies as they happen.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type")]
pub enum DisplayEvent {
    #[serde(rename = "position")]
    Position {
        from: usize,
        to: usize,
        committed: bool,
    },
    #[serde(rename = "running")]
    Running { running: bool },
    /// Remaining countdown steps; `0` hides the countdown.
    #[serde(rename = "countdown")]
    Countdown { remaining: u32 },
    #[serde(rename = "recognizer")]
    Recognizer { state: crate::RecognizerState },
}

impl From<PositionChange> for DisplayEvent {
    fn from(change: PositionChange) -> Self {
        Self::Position {
            from: change.from,
            to: change.to,
            committed: change.committed,
        }
    }
}
