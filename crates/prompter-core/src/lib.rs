mod actors;
mod error;
mod events;
mod link;
mod recognizer;
mod runtime;

pub use actors::*;
pub use error::*;
pub use events::*;
pub use link::{HostLink, HostLinkEvent, LinkConfig, RemoteController, RemoteEvent};
pub use recognizer::*;
pub use runtime::*;
