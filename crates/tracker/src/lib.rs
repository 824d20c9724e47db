pub mod input;
pub mod matcher;
pub mod position;
pub mod tracking;

pub use input::Hypothesis;
pub use matcher::{AlignOptions, align, align_words};
pub use position::{PositionChange, PositionController};
pub use tracking::Tracker;

pub use vp_script::{ScriptIndex, ScriptWord, normalize, split_spoken};
