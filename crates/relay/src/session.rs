use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;

use vp_relay_interface::{PeerMessage, RelayMessage, Role, SessionId};

use crate::ProtocolError;

/// Outbound text frames for one connection, drained by its writer task.
pub type Outbox = mpsc::UnboundedSender<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Peer {
    Unidentified,
    Host(SessionId),
    Remote(SessionId),
}

struct Connection {
    outbox: Outbox,
    peer: Peer,
}

struct Session {
    host: ConnectionId,
    remotes: BTreeSet<ConnectionId>,
    last_state: Option<Value>,
}

/// Every session and connection the relay knows about.
///
/// All methods are synchronous and only push into outboxes, so callers can
/// hold one lock around the manager for the whole of a message and never
/// across I/O. A host leaving removes its session in the same call that
/// tells its remotes, so no later message can reach a dead session.
#[derive(Default)]
pub struct SessionManager {
    next_id: u64,
    connections: HashMap<ConnectionId, Connection>,
    sessions: HashMap<SessionId, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, outbox: Outbox) -> ConnectionId {
        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.connections.insert(
            id,
            Connection {
                outbox,
                peer: Peer::Unidentified,
            },
        );
        tracing::debug!(conn = %id, "connection_opened");
        id
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn remote_count(&self, session: &SessionId) -> Option<usize> {
        self.sessions.get(session).map(|s| s.remotes.len())
    }

    pub fn handle_text(&mut self, conn: ConnectionId, text: &str) {
        if !self.connections.contains_key(&conn) {
            return;
        }

        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(conn = %conn, error = %e, "invalid_json");
                self.send_message(conn, &ProtocolError::InvalidJson.to_message());
                return;
            }
        };

        let message: PeerMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(conn = %conn, error = %e, "unrecognized_message_ignored");
                return;
            }
        };

        match message {
            PeerMessage::Hello { role, id, .. } => {
                self.detach(conn);
                match role {
                    Role::Host => self.open_session(conn),
                    Role::Remote => self.join_session(conn, id.as_deref()),
                }
            }
            PeerMessage::Cmd { .. } => self.forward_command(conn, text),
            PeerMessage::State { state } => self.update_state(conn, text, state),
        }
    }

    pub fn disconnect(&mut self, conn: ConnectionId) {
        self.detach(conn);
        if self.connections.remove(&conn).is_some() {
            tracing::debug!(conn = %conn, "connection_closed");
        }
    }

    fn open_session(&mut self, conn: ConnectionId) {
        let mut id = SessionId::generate();
        while self.sessions.contains_key(&id) {
            id = SessionId::generate();
        }

        self.sessions.insert(
            id.clone(),
            Session {
                host: conn,
                remotes: BTreeSet::new(),
                last_state: None,
            },
        );
        self.set_peer(conn, Peer::Host(id.clone()));
        self.send_message(conn, &RelayMessage::Session { id: id.to_string() });

        tracing::info!(conn = %conn, session_id = %id, "session_created");
    }

    fn join_session(&mut self, conn: ConnectionId, raw_id: Option<&str>) {
        let Some(id) = raw_id.and_then(SessionId::parse) else {
            self.send_message(conn, &ProtocolError::UnknownSession.to_message());
            return;
        };

        let host_open = self
            .sessions
            .get(&id)
            .and_then(|s| self.connections.get(&s.host))
            .is_some_and(|host| !host.outbox.is_closed());

        let Some(session) = self.sessions.get_mut(&id).filter(|_| host_open) else {
            tracing::debug!(conn = %conn, session_id = %id, "remote_rejected");
            self.send_message(conn, &ProtocolError::UnknownSession.to_message());
            return;
        };

        session.remotes.insert(conn);
        let last_state = session.last_state.clone();

        self.set_peer(conn, Peer::Remote(id.clone()));
        self.send_message(conn, &RelayMessage::Ok);
        if let Some(state) = last_state {
            self.send_message(conn, &RelayMessage::State { state });
        }
        self.broadcast_remote_count(&id);

        tracing::info!(conn = %conn, session_id = %id, "remote_joined");
    }

    fn forward_command(&mut self, conn: ConnectionId, text: &str) {
        let Some(Peer::Remote(id)) = self.peer(conn) else {
            return;
        };
        if let Some(host) = self.sessions.get(id).map(|s| s.host) {
            self.send_raw(host, text);
        }
    }

    fn update_state(&mut self, conn: ConnectionId, text: &str, state: Value) {
        let Some(Peer::Host(id)) = self.peer(conn).cloned() else {
            return;
        };
        let Some(session) = self.sessions.get_mut(&id) else {
            return;
        };

        session.last_state = (!state.is_null()).then_some(state);
        let remotes: Vec<_> = session.remotes.iter().copied().collect();
        for remote in remotes {
            self.send_raw(remote, text);
        }
    }

    /// Undo whatever role `conn` has taken, leaving it unidentified.
    fn detach(&mut self, conn: ConnectionId) {
        let Some(peer) = self.peer(conn).cloned() else {
            return;
        };

        match peer {
            Peer::Unidentified => {}
            Peer::Host(id) => {
                if let Some(session) = self.sessions.remove(&id) {
                    let message = ProtocolError::HostDisconnected.to_message();
                    for remote in &session.remotes {
                        self.send_message(*remote, &message);
                        self.set_peer(*remote, Peer::Unidentified);
                    }
                    tracing::info!(
                        conn = %conn,
                        session_id = %id,
                        remotes = session.remotes.len(),
                        "session_closed"
                    );
                }
            }
            Peer::Remote(id) => {
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.remotes.remove(&conn);
                    self.broadcast_remote_count(&id);
                }
                tracing::info!(conn = %conn, session_id = %id, "remote_left");
            }
        }

        self.set_peer(conn, Peer::Unidentified);
    }

    fn broadcast_remote_count(&self, id: &SessionId) {
        let Some(session) = self.sessions.get(id) else {
            return;
        };
        let message = RelayMessage::RemoteCount {
            n: session.remotes.len(),
        };
        for remote in &session.remotes {
            self.send_message(*remote, &message);
        }
    }

    fn peer(&self, conn: ConnectionId) -> Option<&Peer> {
        self.connections.get(&conn).map(|c| &c.peer)
    }

    fn set_peer(&mut self, conn: ConnectionId, peer: Peer) {
        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.peer = peer;
        }
    }

    fn send_message(&self, conn: ConnectionId, message: &RelayMessage) {
        self.send_raw(conn, &message.to_json());
    }

    fn send_raw(&self, conn: ConnectionId, text: &str) {
        if let Some(connection) = self.connections.get(&conn) {
            // A closed outbox means the socket is already going away.
            let _ = connection.outbox.send(text.to_string());
        }
    }
}
