use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower_http::cors::{self, CorsLayer};
use tracing::Instrument;

use crate::{ConnectionId, RelayConfig, SessionManager, lan_ipv4_addrs};

#[derive(Clone)]
pub(crate) struct AppState {
    config: RelayConfig,
    manager: Arc<Mutex<SessionManager>>,
}

impl AppState {
    fn manager(&self) -> MutexGuard<'_, SessionManager> {
        self.manager.lock().unwrap_or_else(|e| {
            tracing::warn!("session_manager_mutex_poisoned");
            e.into_inner()
        })
    }
}

pub fn router(config: RelayConfig) -> Router {
    let allow_any_origin = config.allow_any_origin;
    let state = AppState {
        config,
        manager: Arc::new(Mutex::new(SessionManager::new())),
    };

    let router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/lan", get(lan))
        .with_state(state);

    if allow_any_origin {
        router.layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
    } else {
        router
    }
}

async fn health(State(state): State<AppState>) -> &'static str {
    state.config.version
}

#[derive(serde::Serialize)]
struct LanResponse {
    ips: Vec<String>,
}

async fn lan() -> Json<LanResponse> {
    let ips = tokio::task::spawn_blocking(lan_ipv4_addrs)
        .await
        .unwrap_or_default();

    Json(LanResponse {
        ips: ips.iter().map(ToString::to_string).collect(),
    })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = state.manager().connect(tx);
        handle_socket(socket, conn, rx, state)
            .instrument(tracing::info_span!("relay_connection", conn = %conn))
            .await;
    })
}

async fn handle_socket(
    socket: WebSocket,
    conn: ConnectionId,
    mut outbox: mpsc::UnboundedReceiver<String>,
    state: AppState,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let writer = tokio::spawn(
        async move {
            while let Some(text) = outbox.recv().await {
                if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                    tracing::debug!(error = %e, "ws_send_failed");
                    break;
                }
            }
            let _ = ws_sender.close().await;
        }
        .in_current_span(),
    );

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                state.manager().handle_text(conn, text.as_str());
            }
            Ok(Message::Binary(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                state.manager().handle_text(conn, &text);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "ws_receive_failed");
                break;
            }
        }
    }

    // Dropping the manager's outbox sender lets the writer drain and exit.
    state.manager().disconnect(conn);
    let _ = writer.await;
}
