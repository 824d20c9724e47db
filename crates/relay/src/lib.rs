mod error;
mod lan;
mod routes;
mod session;

pub use error::ProtocolError;
pub use lan::lan_ipv4_addrs;
pub use routes::router;
pub use session::{ConnectionId, Outbox, SessionManager};

/// Ports tried in order when no explicit port is configured.
pub const DEFAULT_PORTS: [u16; 5] = [32177, 32178, 32179, 32280, 33333];

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub version: &'static str,
    pub allow_any_origin: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            allow_any_origin: true,
        }
    }
}

impl RelayConfig {
    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    pub fn with_allow_any_origin(mut self, allow: bool) -> Self {
        self.allow_any_origin = allow;
        self
    }
}
