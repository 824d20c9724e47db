use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use vp_relay_interface::{Command, PeerMessage, RelayMessage, SessionId, StateSnapshot};

use super::{LinkConfig, WsStream, connect, wait_reconnect};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostLinkEvent {
    Connected,
    Session { id: String },
    Command { command: Command },
    RemoteCount { n: usize },
    Error { message: String },
    Disconnected,
}

/// The host's connection to the relay.
///
/// Registers as host, pushes the newest snapshot once a session id arrives,
/// then forwards every snapshot from the remote fan-out channel. Relay
/// commands come back as [`HostLinkEvent::Command`]. After any disconnect it
/// waits `reconnect_delay` and starts over with a fresh session.
pub struct HostLink {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl HostLink {
    pub fn spawn(
        config: LinkConfig,
        snapshots: mpsc::UnboundedReceiver<Arc<StateSnapshot>>,
        latest: watch::Receiver<Option<Arc<StateSnapshot>>>,
        on_event: impl Fn(HostLinkEvent) + Send + Sync + 'static,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            config,
            snapshots,
            latest,
            on_event,
            cancel.clone(),
        ));
        Self { cancel, handle }
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for HostLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum Ended {
    Disconnected,
    Stopped,
}

async fn run(
    config: LinkConfig,
    mut snapshots: mpsc::UnboundedReceiver<Arc<StateSnapshot>>,
    latest: watch::Receiver<Option<Arc<StateSnapshot>>>,
    on_event: impl Fn(HostLinkEvent),
    cancel: CancellationToken,
) {
    loop {
        let Some(connected) = draining(connect(&config.url, &cancel), &mut snapshots).await else {
            return;
        };

        if let Some(ws) = connected {
            tracing::info!(url = %config.url, "host_link_connected");
            on_event(HostLinkEvent::Connected);

            let ended = serve(ws, &mut snapshots, &latest, &on_event, &cancel).await;
            on_event(HostLinkEvent::Disconnected);
            if matches!(ended, Ended::Stopped) {
                return;
            }
            tracing::info!("host_link_disconnected");
        } else {
            on_event(HostLinkEvent::Disconnected);
        }

        let waited = draining(wait_reconnect(config.reconnect_delay, &cancel), &mut snapshots).await;
        if waited != Some(true) {
            return;
        }
    }
}

/// Drive `fut` while discarding snapshots that arrive without a session to
/// send them to. `None` once the snapshot channel has closed.
async fn draining<F: Future>(
    fut: F,
    snapshots: &mut mpsc::UnboundedReceiver<Arc<StateSnapshot>>,
) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return Some(out),
            snapshot = snapshots.recv() => {
                if snapshot.is_none() {
                    return None;
                }
            }
        }
    }
}

async fn serve(
    ws: WsStream,
    snapshots: &mut mpsc::UnboundedReceiver<Arc<StateSnapshot>>,
    latest: &watch::Receiver<Option<Arc<StateSnapshot>>>,
    on_event: &impl Fn(HostLinkEvent),
    cancel: &CancellationToken,
) -> Ended {
    let (mut ws_sender, mut ws_receiver) = ws.split();
    let mut session: Option<SessionId> = None;

    let hello = serde_json::to_string(&PeerMessage::host_hello()).unwrap_or_default();
    if let Err(e) = ws_sender.send(Message::Text(hello.into())).await {
        tracing::warn!(error = %e, "host_hello_failed");
        return Ended::Disconnected;
    }

    loop {
        let outgoing = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_sender.close().await;
                return Ended::Stopped;
            }
            snapshot = snapshots.recv() => match snapshot {
                Some(snapshot) if session.is_some() => state_frame(&snapshot),
                Some(_) => None,
                None => {
                    let _ = ws_sender.close().await;
                    return Ended::Stopped;
                }
            },
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_relay_message(text.as_str(), &mut session, latest, on_event)
                }
                Some(Ok(Message::Close(_))) | None => return Ended::Disconnected,
                Some(Ok(_)) => None,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "host_link_receive_failed");
                    return Ended::Disconnected;
                }
            },
        };

        if let Some(frame) = outgoing
            && let Err(e) = ws_sender.send(Message::Text(frame.into())).await
        {
            tracing::warn!(error = %e, "host_link_send_failed");
            return Ended::Disconnected;
        }
    }
}

/// Returns a frame to send back to the relay, if any.
fn handle_relay_message(
    text: &str,
    session: &mut Option<SessionId>,
    latest: &watch::Receiver<Option<Arc<StateSnapshot>>>,
    on_event: &impl Fn(HostLinkEvent),
) -> Option<String> {
    let message: RelayMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(error = %e, "relay_message_ignored");
            return None;
        }
    };

    match message {
        RelayMessage::Session { id } => {
            tracing::info!(session_id = %id, "relay_session_assigned");
            *session = SessionId::parse(&id);
            on_event(HostLinkEvent::Session { id });
            latest.borrow().as_deref().and_then(state_frame)
        }
        RelayMessage::Cmd { cmd } => {
            match cmd.parse::<Command>() {
                Ok(command) => on_event(HostLinkEvent::Command { command }),
                Err(_) => tracing::debug!(cmd = %cmd, "unknown_command_ignored"),
            }
            None
        }
        RelayMessage::RemoteCount { n } => {
            on_event(HostLinkEvent::RemoteCount { n });
            None
        }
        RelayMessage::Err { message } => {
            on_event(HostLinkEvent::Error { message });
            None
        }
        RelayMessage::Ok | RelayMessage::State { .. } => None,
    }
}

fn state_frame(snapshot: &StateSnapshot) -> Option<String> {
    let state = match serde_json::to_value(snapshot) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "snapshot_serialize_failed");
            return None;
        }
    };
    serde_json::to_string(&PeerMessage::State { state }).ok()
}
