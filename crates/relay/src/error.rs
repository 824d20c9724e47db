use vp_relay_interface::RelayMessage;

/// Failures reported back to the connection that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Unknown or inactive session")]
    UnknownSession,
    #[error("Host disconnected")]
    HostDisconnected,
}

impl ProtocolError {
    pub fn to_message(self) -> RelayMessage {
        RelayMessage::err(self.to_string())
    }
}
