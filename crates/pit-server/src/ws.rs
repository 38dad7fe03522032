//! WebSocket connections.

use crate::protocol::ServerMessage;
use crate::server::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    // Subscribe and read history under one lock: every reading lands in
    // exactly one of the two.
    let (mut updates, history) = {
        let engine = state.engine.lock().await;
        let updates = state.broadcaster.subscribe();
        let history = engine
            .history()
            .and_then(|h| ServerMessage::History(h).encode());
        (updates, history)
    };
    tracing::info!(
        clients = state.broadcaster.subscriber_count(),
        "client connected"
    );

    if let Some(history) = history {
        if send_text(&mut socket, history).await.is_err() {
            tracing::info!("client disconnected before history was sent");
            return;
        }
    }

    let mut shutdown = state.shutdown.clone();
    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = state.gateway.handle_text(&text).await {
                        if send_text(&mut socket, reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "websocket error");
                    break;
                }
            },
            outbound = updates.recv() => match outbound {
                Ok(msg) => {
                    if send_text(&mut socket, msg).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "slow client skipped messages");
                }
                Err(RecvError::Closed) => break,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    tracing::info!("client disconnected");
}

async fn send_text(socket: &mut WebSocket, text: Arc<str>) -> Result<(), axum::Error> {
    socket.send(Message::Text(text.to_string())).await
}
