mod host;
mod remote;

pub use host::{HostLink, HostLinkEvent};
pub use remote::{RemoteController, RemoteEvent};

use std::time::Duration;

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Relay WebSocket endpoint, e.g. `ws://192.168.1.20:32177/ws`.
    pub url: String,
    pub reconnect_delay: Duration,
}

impl LinkConfig {
    pub fn host(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_millis(1000),
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_millis(1200),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// `None` if cancelled or the connection attempt failed.
pub(crate) async fn connect(url: &str, cancel: &CancellationToken) -> Option<WsStream> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        result = connect_async(url) => match result {
            Ok((ws, _)) => Some(ws),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "relay_connect_failed");
                None
            }
        },
    }
}

/// `false` if cancelled while waiting.
pub(crate) async fn wait_reconnect(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
