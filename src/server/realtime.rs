//! Realtime channel: a WebSocket that acknowledges twin subscriptions.
//!
//! Nothing is pushed beyond the acknowledgements.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Frames exchanged on the socket: `{"event": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Frame {
    Connected { message: String },
    SubscribeTwin {
        #[serde(default)]
        twin_id: Value,
    },
    Subscribed { twin_id: Value, status: String },
}

impl Frame {
    pub fn connected() -> Self {
        Frame::Connected {
            message: "Connected to CarbonTwin real-time updates".to_string(),
        }
    }
}

/// The server's reply to one client frame, if any.
pub fn respond(frame: Frame) -> Option<Frame> {
    match frame {
        Frame::SubscribeTwin { twin_id } => {
            info!(twin_id = %twin_id, "client subscribed to twin");
            Some(Frame::Subscribed {
                twin_id,
                status: "subscribed".to_string(),
            })
        }
        Frame::Connected { .. } | Frame::Subscribed { .. } => None,
    }
}

pub async fn socket_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

async fn send(socket: &mut WebSocket, frame: &Frame) -> bool {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "failed to encode frame");
            return true;
        }
    };
    socket.send(Message::Text(text)).await.is_ok()
}

async fn handle_socket(mut socket: WebSocket) {
    info!("realtime client connected");
    if !send(&mut socket, &Frame::connected()).await {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let frame = match serde_json::from_str::<Frame>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "ignoring unrecognised frame");
                continue;
            }
        };
        if let Some(reply) = respond(frame) {
            if !send(&mut socket, &reply).await {
                break;
            }
        }
    }
    info!("realtime client disconnected");
}
