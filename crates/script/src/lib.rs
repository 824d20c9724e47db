mod index;
mod normalize;

pub use index::{ScriptIndex, ScriptWord};
pub use normalize::{normalize, split_spoken};
