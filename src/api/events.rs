//! WebSocket change feed.
//!
//! Clients connect to `GET /ws` and receive a JSON frame for every mutation
//! (task/list created, updated, deleted). Fan-out is best-effort: a slow
//! subscriber skips the frames it missed rather than stalling the server.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::routes::AppState;
use crate::storage::models::{StoredList, StoredTask};

/// A change announced to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    TaskCreated {
        list_id: u64,
        task: StoredTask,
    },
    TaskUpdated {
        list_id: u64,
        task: StoredTask,
        created_task: Option<StoredTask>,
    },
    TaskDeleted {
        list_id: u64,
        task_id: u64,
    },
    ListCreated {
        list: StoredList,
    },
    ListUpdated {
        list: StoredList,
    },
    ListDeleted {
        list_id: u64,
    },
}

/// Broadcast hub for change events.
///
/// Wraps a `tokio::sync::broadcast` channel of pre-serialized frames; each
/// WebSocket connection holds its own receiver.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<String>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Publish an event to all connected clients.
    pub fn publish(&self, event: &ChangeEvent) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to serialize change event: {}", e);
                return;
            }
        };
        // send only errors when there are no subscribers; that's fine.
        let _ = self.tx.send(frame);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    fn connections(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket endpoint for the change feed.
pub async fn change_feed_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_change_feed(socket, state))
}

async fn handle_change_feed(socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.events.subscribe();
    tracing::info!(
        "WebSocket connected. Total connections: {}",
        state.events.connections()
    );

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if sender.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("WebSocket client lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = receiver.next() => {
                match msg {
                    // Echo text frames back so clients can ping/pong.
                    Some(Ok(Message::Text(text))) => {
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    drop(rx);
    tracing::info!(
        "WebSocket disconnected. Total connections: {}",
        state.events.connections()
    );
}
