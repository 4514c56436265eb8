//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::session::registry::OUTBOUND_QUEUE_CAPACITY;
use crate::session::SessionEvent;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
///
/// The fresh uuid minted here is the connection identity for the socket's
/// whole lifetime, and becomes the vessel id if the client joins.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let conn_id = Uuid::new_v4();
    ws.on_upgrade(move |socket| handle_socket(socket, conn_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, conn_id: Uuid, state: AppState) {
    info!(conn_id = %conn_id, "New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Register with the session registry; the registry writes to outbound_tx,
    // the writer task drains it into the socket
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMsg>(OUTBOUND_QUEUE_CAPACITY);
    let event_tx = state.sessions.event_tx.clone();

    if event_tx
        .send(SessionEvent::Connected {
            conn_id,
            tx: outbound_tx,
        })
        .await
        .is_err()
    {
        warn!(conn_id = %conn_id, "Session registry unavailable");
        return;
    }

    // Writer task: registry -> WebSocket
    let writer_conn_id = conn_id;
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = ws_sink.send(Message::Text(json)).await {
                        debug!(conn_id = %writer_conn_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(e) => {
                    warn!(conn_id = %writer_conn_id, error = %e, "Failed to serialize message");
                }
            }
        }
    });

    // Reader loop: WebSocket -> session registry
    let rate_limiter = ConnectionRateLimiter::new();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn_id = %conn_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        let event = SessionEvent::Inbound {
                            conn_id,
                            msg,
                            received_at: unix_millis(),
                        };
                        if event_tx.send(event).await.is_err() {
                            debug!(conn_id = %conn_id, "Event channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        // Malformed payloads fail closed: drop, never crash
                        warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Transport-level keepalive; the protocol has its own probes
            }
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect so the registry removes the vessel and cancels timers
    let _ = event_tx.send(SessionEvent::Disconnected { conn_id }).await;

    writer_handle.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
