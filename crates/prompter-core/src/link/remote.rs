use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use vp_relay_interface::{Command, PeerMessage, RelayMessage, SessionId, StateSnapshot};

use super::{LinkConfig, WsStream, connect, wait_reconnect};

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    Connected,
    /// The relay admitted us into the session.
    Accepted,
    State(StateSnapshot),
    RemoteCount(usize),
    Error(String),
    Disconnected,
}

/// A remote control joined to one relay session.
///
/// Commands sent while disconnected are dropped, matching a button press on
/// a dead connection. Reconnects after `reconnect_delay` indefinitely.
pub struct RemoteController {
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RemoteController {
    pub fn spawn(
        config: LinkConfig,
        session: SessionId,
        on_event: impl Fn(RemoteEvent) + Send + Sync + 'static,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (commands, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(config, session, rx, on_event, cancel.clone()));
        Self {
            commands,
            cancel,
            handle,
        }
    }

    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RemoteController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    config: LinkConfig,
    session: SessionId,
    mut commands: mpsc::UnboundedReceiver<Command>,
    on_event: impl Fn(RemoteEvent),
    cancel: CancellationToken,
) {
    loop {
        if let Some(ws) = connect(&config.url, &cancel).await {
            on_event(RemoteEvent::Connected);
            while commands.try_recv().is_ok() {}

            let stopped = serve(ws, &session, &mut commands, &on_event, &cancel).await;
            on_event(RemoteEvent::Disconnected);
            if stopped {
                return;
            }
            tracing::info!(session_id = %session, "remote_disconnected");
        } else {
            on_event(RemoteEvent::Disconnected);
        }

        if !wait_reconnect(config.reconnect_delay, &cancel).await {
            return;
        }
    }
}

/// Returns `true` when the controller was shut down.
async fn serve(
    ws: WsStream,
    session: &SessionId,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    on_event: &impl Fn(RemoteEvent),
    cancel: &CancellationToken,
) -> bool {
    let (mut ws_sender, mut ws_receiver) = ws.split();

    let hello = serde_json::to_string(&PeerMessage::remote_hello(session.as_str())).unwrap_or_default();
    if let Err(e) = ws_sender.send(Message::Text(hello.into())).await {
        tracing::warn!(error = %e, "remote_hello_failed");
        return false;
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_sender.close().await;
                return true;
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    let _ = ws_sender.close().await;
                    return true;
                };
                let frame = serde_json::to_string(&PeerMessage::command(command)).unwrap_or_default();
                if let Err(e) = ws_sender.send(Message::Text(frame.into())).await {
                    tracing::warn!(error = %e, "remote_send_failed");
                    return false;
                }
            }
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_relay_message(text.as_str(), on_event),
                Some(Ok(Message::Close(_))) | None => return false,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "remote_receive_failed");
                    return false;
                }
            },
        }
    }
}

fn handle_relay_message(text: &str, on_event: &impl Fn(RemoteEvent)) {
    let message: RelayMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(error = %e, "relay_message_ignored");
            return;
        }
    };

    match message {
        RelayMessage::Ok => on_event(RemoteEvent::Accepted),
        RelayMessage::State { state } => match serde_json::from_value(state) {
            Ok(snapshot) => on_event(RemoteEvent::State(snapshot)),
            Err(e) => tracing::debug!(error = %e, "remote_state_unreadable"),
        },
        RelayMessage::RemoteCount { n } => on_event(RemoteEvent::RemoteCount(n)),
        RelayMessage::Err { message } => on_event(RemoteEvent::Error(message)),
        RelayMessage::Session { .. } | RelayMessage::Cmd { .. } => {}
    }
}
