mod command;
mod message;
mod session_id;
mod snapshot;

pub use command::Command;
pub use message::{PROTOCOL_VERSION, PeerMessage, RelayMessage, Role};
pub use session_id::SessionId;
pub use snapshot::{Mode, Settings, StateSnapshot};

#[macro_export]
macro_rules! common_derives {
    ($item:item) => {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        $item
    };
}
