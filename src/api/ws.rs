//! Real-time status channel
//!
//! Each socket is one hub watcher. The writer task drains the watcher's
//! queue into the socket; the reader only watches for the peer going away.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::ApiState;
use crate::hub::{HubEvent, Subscription};

/// GET /ws (and /api/ws)
pub async fn status_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| watch(socket, state))
}

async fn watch(mut socket: WebSocket, state: Arc<ApiState>) {
    // Subscribe before the greeting so no broadcast falls in between
    let Subscription { id, mut receiver } = state.hub.subscribe();
    debug!("WebSocket watcher {} connected", id);

    if let Ok(status) = state.obs.get_status().await {
        if let Ok(text) = serde_json::to_string(&HubEvent::StatusUpdate(status)) {
            if socket.send(Message::Text(text)).await.is_err() {
                state.hub.unregister(id);
                return;
            }
        }
    }

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            if sink.send(Message::Text(message.to_string())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    state.hub.unregister(id);
    debug!("WebSocket watcher {} disconnected", id);
}
