/// One event from a streaming recognizer.
///
/// Convert provider callbacks into `Hypothesis` before handing them to
/// [`crate::tracking::Tracker::process`]. `Interim` text is the recognizer's
/// current guess for the utterance in progress and may be revised; `Final`
/// text will not change again.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Hypothesis {
    Final { text: String },
    Interim { text: String },
}

impl Hypothesis {
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        let text = text.into();
        if is_final {
            Self::Final { text }
        } else {
            Self::Interim { text }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Final { text } | Self::Interim { text } => text,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }
}
